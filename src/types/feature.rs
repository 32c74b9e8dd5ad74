use std::sync::Arc;

use geo::{MultiPolygon, Point, Polygon};
use serde_json::Value;

use crate::frame::ReferenceFrame;
use super::FeatureKey;

/// Weight assigned to a point whose source attribute is missing or unusable.
pub const DEFAULT_WEIGHT: u64 = 1;

/// Coerce a raw source attribute into a point weight.
///
/// Non-negative integers (as JSON numbers, integral floats, or numeric
/// strings) are taken as-is; anything else falls back to `DEFAULT_WEIGHT`.
pub fn coerce_weight(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64()
            .or_else(|| n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64))
            .unwrap_or(DEFAULT_WEIGHT),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(DEFAULT_WEIGHT),
        _ => DEFAULT_WEIGHT,
    }
}

/// Boundary of a raw fragment, as delivered by the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Boundary {
    /// Iterate over the polygon parts of this boundary.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon<f64>> {
        match self {
            Boundary::Polygon(polygon) => std::slice::from_ref(polygon).iter(),
            Boundary::MultiPolygon(multi) => multi.0.iter(),
        }
    }

    /// Promote to a multi-polygon; multi-polygons pass through unchanged.
    pub fn into_multi_polygon(self) -> MultiPolygon<f64> {
        match self {
            Boundary::Polygon(polygon) => MultiPolygon(vec![polygon]),
            Boundary::MultiPolygon(multi) => multi,
        }
    }
}

impl From<Polygon<f64>> for Boundary {
    fn from(polygon: Polygon<f64>) -> Self { Boundary::Polygon(polygon) }
}

impl From<MultiPolygon<f64>> for Boundary {
    fn from(multi: MultiPolygon<f64>) -> Self { Boundary::MultiPolygon(multi) }
}

/// A single weighted point observation (e.g. one bench).
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub id: i64,
    pub label: Option<Arc<str>>,
    pub weight: u64,  // Seating capacity
    pub position: Point<f64>,
}

impl PointFeature {
    /// Create a point feature with the default weight and no label.
    pub fn new(id: i64, position: Point<f64>) -> Self {
        Self { id, label: None, weight: DEFAULT_WEIGHT, position }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(Arc::from(label));
        self
    }

    pub fn with_weight(mut self, weight: u64) -> Self {
        self.weight = weight;
        self
    }
}

/// One raw polygon piece of a park, before identity-based merging.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFragment {
    pub id: i64,
    pub label: Option<Arc<str>>,
    pub boundary: Boundary,
}

impl PolygonFragment {
    pub fn new(id: i64, label: Option<&str>, boundary: impl Into<Boundary>) -> Self {
        Self { id, label: label.map(Arc::from), boundary: boundary.into() }
    }

    /// Identity key used to group fragments.
    #[inline] pub fn key(&self) -> FeatureKey {
        FeatureKey { id: self.id, label: self.label.clone() }
    }
}

/// A batch of features delivered by one source, tagged with its reference frame.
#[derive(Debug, Clone)]
pub struct FeatureSet<T> {
    pub frame: ReferenceFrame,
    pub features: Vec<T>,
}

impl<T> FeatureSet<T> {
    pub fn new(frame: ReferenceFrame, features: Vec<T>) -> Self {
        Self { frame, features }
    }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }
}

#[cfg(test)]
mod tests {
    use geo::{point, polygon};
    use serde_json::json;

    use super::*;

    #[test]
    fn weight_defaults_to_one() {
        assert_eq!(coerce_weight(None), 1);
        assert_eq!(coerce_weight(Some(&Value::Null)), 1);
        assert_eq!(coerce_weight(Some(&json!("many"))), 1);
        assert_eq!(coerce_weight(Some(&json!(true))), 1);
        assert_eq!(coerce_weight(Some(&json!([3]))), 1);
    }

    #[test]
    fn weight_accepts_non_negative_integers() {
        assert_eq!(coerce_weight(Some(&json!(4))), 4);
        assert_eq!(coerce_weight(Some(&json!(0))), 0);
        assert_eq!(coerce_weight(Some(&json!(3.0))), 3);
        assert_eq!(coerce_weight(Some(&json!(" 12 "))), 12);
    }

    #[test]
    fn weight_rejects_negative_and_fractional() {
        assert_eq!(coerce_weight(Some(&json!(-2))), 1);
        assert_eq!(coerce_weight(Some(&json!(2.5))), 1);
        assert_eq!(coerce_weight(Some(&json!("-2"))), 1);
        assert_eq!(coerce_weight(Some(&json!("2.5"))), 1);
    }

    #[test]
    fn polygon_is_promoted_to_single_part() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let multi = Boundary::from(square.clone()).into_multi_polygon();
        assert_eq!(multi.0, vec![square]);
    }

    #[test]
    fn multi_polygon_passes_through() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let b = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0)];
        let multi = MultiPolygon(vec![a, b]);
        let boundary = Boundary::from(multi.clone());
        assert_eq!(boundary.polygons().count(), 2);
        assert_eq!(boundary.into_multi_polygon(), multi);
    }

    #[test]
    fn point_builder() {
        let bench = PointFeature::new(11, point!(x: 1.0, y: 2.0)).with_label("Memorial").with_weight(3);
        assert_eq!(bench.weight, 3);
        assert_eq!(bench.label.as_deref(), Some("Memorial"));
        assert_eq!(PointFeature::new(12, point!(x: 0.0, y: 0.0)).weight, DEFAULT_WEIGHT);
    }
}
