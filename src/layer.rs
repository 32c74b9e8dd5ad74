use geo::{BoundingRect, MultiPolygon, Point, Rect};

use crate::{
    config::StatsConfig,
    error::StatsError,
    frame::ReferenceFrame,
    geom::{self, BoundaryRule, SpatialIndex},
    join,
    report::{RunReport, Warning},
    types::{AggregateRecord, CanonicalPolygon, FeatureSet, PointFeature, PolygonFragment},
};

/// The canonical park polygons of one run, with their containment index.
#[derive(Debug)]
pub struct ParkLayer {
    frame: ReferenceFrame,
    parks: Vec<CanonicalPolygon>,
    index: Option<SpatialIndex>, // Built on demand over `parks`, in the same order
    report: RunReport,
}

impl ParkLayer {
    /// Merge raw fragments into canonical parks. The index is not built yet.
    pub fn from_fragments(fragments: FeatureSet<PolygonFragment>, parallel: bool) -> Self {
        let FeatureSet { frame, features } = fragments;
        let (parks, report) = geom::merge_fragments(features, parallel);
        Self { frame, parks, index: None, report }
    }

    #[inline] pub fn frame(&self) -> ReferenceFrame { self.frame }

    #[inline] pub fn parks(&self) -> &[CanonicalPolygon] { &self.parks }

    #[inline] pub fn report(&self) -> &RunReport { &self.report }

    #[inline] pub fn index(&self) -> Option<&SpatialIndex> { self.index.as_ref() }

    /// Build (or rebuild) the containment index over the canonical parks.
    pub fn build_index(&mut self) {
        let shapes = self.parks.iter()
            .map(|park| park.boundary.clone())
            .collect::<Vec<MultiPolygon<f64>>>();
        self.index = Some(SpatialIndex::new(&shapes));
    }

    /// Join points against the parks and compute one record per park.
    ///
    /// Fails without producing any records if the points are in another
    /// frame or the index has not been built.
    pub fn aggregate(&self, points: &FeatureSet<PointFeature>, rule: BoundaryRule, parallel: bool) -> Result<Vec<AggregateRecord>, StatsError> {
        ReferenceFrame::reconcile(self.frame, points.frame)?;
        let index = self.index.as_ref().ok_or(StatsError::MissingIndex)?;

        let tallies = join::aggregate(index, &points.features, rule, parallel);

        self.parks.iter().zip(tallies)
            .map(|(park, tally)| {
                let (envelope, area) = geom::derive_attributes(&park.key(), &park.boundary)?;
                Ok(AggregateRecord {
                    id: park.id,
                    label: park.label.clone(),
                    count: tally.count,
                    total_weight: tally.total_weight,
                    boundary: park.boundary.clone(),
                    envelope,
                    area,
                })
            })
            .collect()
    }
}

/// Output of a complete run.
#[derive(Debug, Clone)]
pub struct ParkStats {
    pub frame: ReferenceFrame,
    pub parks: Vec<CanonicalPolygon>,
    pub points: Vec<PointFeature>,
    pub records: Vec<AggregateRecord>,
    pub report: RunReport,
}

/// Merge park fragments and aggregate point statistics per park.
///
/// Frame mismatches abort before any work is done. Malformed fragments are
/// skipped and listed in the returned report.
pub fn compute_park_stats(
    mut fragments: FeatureSet<PolygonFragment>,
    mut points: FeatureSet<PointFeature>,
    config: &StatsConfig,
) -> Result<ParkStats, StatsError> {
    let frame = ReferenceFrame::reconcile(fragments.frame, points.frame)?;
    let mut report = RunReport::default();
    let (fragments_read, points_read) = (fragments.len(), points.len());

    if let Some(extent) = config.extent_rect() {
        let (fragments_out, points_out) = clip_to_extent(&mut fragments.features, &mut points.features, &extent);
        if fragments_out + points_out > 0 {
            report.warn(Warning::OutsideExtent { fragments: fragments_out, points: points_out });
        }
    }
    if fragments.is_empty() { report.warn(Warning::EmptyFragments) }
    if points.is_empty() { report.warn(Warning::EmptyPoints) }

    let mut layer = ParkLayer::from_fragments(fragments, config.parallel);
    layer.build_index();
    let records = layer.aggregate(&points, config.boundary_rule, config.parallel)?;

    report.absorb(layer.report);
    // Count what the sources produced, including features clipped by the extent.
    report.fragments_in = fragments_read;
    report.points_in = points_read;
    log::info!(
        "computed statistics for {} parks from {} points in {frame}",
        records.len(), report.points_in,
    );

    Ok(ParkStats { frame, parks: layer.parks, points: points.features, records, report })
}

/// Drop fragments not fully inside `extent` and points not touching it.
/// Returns how many of each were removed.
fn clip_to_extent(fragments: &mut Vec<PolygonFragment>, points: &mut Vec<PointFeature>, extent: &Rect<f64>) -> (usize, usize) {
    let (n_fragments, n_points) = (fragments.len(), points.len());
    fragments.retain(|fragment| fragment.boundary.polygons()
        .all(|polygon| polygon.bounding_rect().is_some_and(|rect| covers(extent, &rect.min().into()) && covers(extent, &rect.max().into()))));
    points.retain(|point| covers(extent, &point.position));
    (n_fragments - fragments.len(), n_points - points.len())
}

/// Point-in-rectangle test, edges included.
#[inline]
fn covers(extent: &Rect<f64>, point: &Point<f64>) -> bool {
    (extent.min().x..=extent.max().x).contains(&point.x()) && (extent.min().y..=extent.max().y).contains(&point.y())
}
