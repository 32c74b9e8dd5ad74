use std::sync::Arc;

use geo::{MultiPolygon, Rect};

use super::FeatureKey;

/// The single merged boundary of one logical park.
/// Always a multi-polygon, even when the merged area is one simple polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPolygon {
    pub id: i64,
    pub label: Option<Arc<str>>,
    pub boundary: MultiPolygon<f64>,
}

impl CanonicalPolygon {
    pub(crate) fn from_key(key: FeatureKey, boundary: MultiPolygon<f64>) -> Self {
        Self { id: key.id, label: key.label, boundary }
    }

    #[inline] pub fn key(&self) -> FeatureKey {
        FeatureKey { id: self.id, label: self.label.clone() }
    }
}

/// Per-park statistics produced by the containment join.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub id: i64,
    pub label: Option<Arc<str>>,
    pub count: u64,         // Number of contained points
    pub total_weight: u64,  // Sum of contained point weights
    pub boundary: MultiPolygon<f64>,
    pub envelope: Rect<f64>,
    pub area: f64,          // Planar area in squared frame units
}

impl AggregateRecord {
    #[inline] pub fn key(&self) -> FeatureKey {
        FeatureKey { id: self.id, label: self.label.clone() }
    }
}
