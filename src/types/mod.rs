mod feature;
mod key;
mod park;

pub use feature::{coerce_weight, Boundary, FeatureSet, PointFeature, PolygonFragment, DEFAULT_WEIGHT};
pub use key::FeatureKey;
pub use park::{AggregateRecord, CanonicalPolygon};
