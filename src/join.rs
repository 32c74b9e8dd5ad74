use rayon::prelude::*;

use crate::{
    geom::{BoundaryRule, SpatialIndex},
    types::PointFeature,
};

/// Running totals for one polygon. Sums saturate at `u64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: u64,
    pub total_weight: u64,
}

impl Tally {
    #[inline]
    fn add(&mut self, weight: u64) {
        self.count = self.count.saturating_add(1);
        self.total_weight = self.total_weight.saturating_add(weight);
    }

    #[inline]
    fn merge(self, other: Tally) -> Tally {
        Tally {
            count: self.count.saturating_add(other.count),
            total_weight: self.total_weight.saturating_add(other.total_weight),
        }
    }
}

/// Fold every point into the tally of each polygon that contains it.
///
/// Returns exactly one tally per indexed polygon (zero for polygons no point
/// falls in). A point inside several overlapping polygons is counted by all
/// of them. With `parallel`, points are split across the rayon pool and the
/// partial tallies summed, which yields the same totals as a sequential pass.
pub fn aggregate(index: &SpatialIndex, points: &[PointFeature], rule: BoundaryRule, parallel: bool) -> Vec<Tally> {
    let n = index.len();
    let fold = |mut tallies: Vec<Tally>, point: &PointFeature| {
        for idx in index.containing(&point.position, rule) {
            tallies[idx].add(point.weight);
        }
        tallies
    };

    let tallies = if parallel {
        points.par_iter()
            .fold(|| vec![Tally::default(); n], fold)
            .reduce(|| vec![Tally::default(); n], |a, b| {
                a.into_iter().zip(b).map(|(x, y)| x.merge(y)).collect()
            })
    } else {
        points.iter().fold(vec![Tally::default(); n], fold)
    };

    log::debug!(
        "joined {} points against {} polygons ({} matches)",
        points.len(), n, tallies.iter().map(|t| t.count).sum::<u64>(),
    );
    tallies
}
