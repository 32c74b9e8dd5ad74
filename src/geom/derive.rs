use geo::{Area, BoundingRect, MultiPolygon, Rect};

use crate::{error::StatsError, types::FeatureKey};

/// Minimal axis-aligned rectangle containing every vertex of `boundary`.
/// `None` for an empty boundary.
#[inline]
pub fn envelope(boundary: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    boundary.bounding_rect()
}

/// Planar area of `boundary`: the sum over parts of exterior minus holes.
#[inline]
pub fn area(boundary: &MultiPolygon<f64>) -> f64 {
    boundary.unsigned_area()
}

/// Compute `(envelope, area)` for a park boundary.
pub(crate) fn derive_attributes(key: &FeatureKey, boundary: &MultiPolygon<f64>) -> Result<(Rect<f64>, f64), StatsError> {
    let envelope = envelope(boundary).ok_or_else(|| StatsError::InvalidGeometry {
        key: key.clone(),
        reason: "boundary is empty, no envelope".into(),
    })?;
    Ok((envelope, area(boundary)))
}
