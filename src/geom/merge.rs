use ahash::AHashMap;
use geo::{BooleanOps, MultiPolygon};
use rayon::prelude::*;

use crate::{
    report::{RunReport, Warning},
    types::{CanonicalPolygon, FeatureKey, PolygonFragment},
};
use super::validate::validate_boundary;

/// Collapse fragments sharing an identity into one canonical multi-polygon each.
///
/// Invalid fragments are dropped from their group and recorded in the
/// returned report. Groups are finalized independently (in parallel when
/// `parallel` is set); output is ordered by key.
pub fn merge_fragments(fragments: Vec<PolygonFragment>, parallel: bool) -> (Vec<CanonicalPolygon>, RunReport) {
    let mut report = RunReport { fragments_in: fragments.len(), ..Default::default() };

    // Group valid fragment boundaries by key.
    let mut groups: AHashMap<FeatureKey, Vec<MultiPolygon<f64>>> = AHashMap::new();
    for fragment in fragments {
        let key = fragment.key();
        match validate_boundary(&fragment.boundary) {
            Ok(()) => groups.entry(key).or_default().push(fragment.boundary.into_multi_polygon()),
            Err(reason) => {
                report.fragments_skipped += 1;
                report.warn(Warning::InvalidFragment { key, reason });
            }
        }
    }

    let mut groups = groups.into_iter().collect::<Vec<_>>();
    groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let merged: Vec<Result<CanonicalPolygon, FeatureKey>> = if parallel {
        groups.into_par_iter().map(|(key, parts)| merge_group(key, parts)).collect()
    } else {
        groups.into_iter().map(|(key, parts)| merge_group(key, parts)).collect()
    };

    let mut polygons = Vec::with_capacity(merged.len());
    for result in merged {
        match result {
            Ok(polygon) => polygons.push(polygon),
            Err(key) => report.warn(Warning::DegenerateUnion { key }),
        }
    }

    report.canonical_polygons = polygons.len();
    log::info!(
        "merged {} fragments into {} parks ({} skipped)",
        report.fragments_in, report.canonical_polygons, report.fragments_skipped,
    );
    (polygons, report)
}

/// Finalize one group: a lone boundary passes through, several are unioned.
/// Fails with the group's key when the result has no polygonal area.
fn merge_group(key: FeatureKey, mut parts: Vec<MultiPolygon<f64>>) -> Result<CanonicalPolygon, FeatureKey> {
    let boundary = if parts.len() == 1 {
        parts.pop()
    } else {
        parts.into_iter().reduce(|a, b| a.union(&b))
    };

    match boundary {
        Some(boundary) if !boundary.0.is_empty() => Ok(CanonicalPolygon::from_key(key, boundary)),
        _ => Err(key),
    }
}
