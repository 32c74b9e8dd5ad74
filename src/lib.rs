#![doc = "Park boundary merging and bench statistics by spatial containment"]
mod config;
mod error;
mod frame;
mod geom;
mod io;
mod join;
mod layer;
mod report;
mod types;

#[doc(inline)]
pub use types::{
    coerce_weight, AggregateRecord, Boundary, CanonicalPolygon, FeatureKey, FeatureSet,
    PointFeature, PolygonFragment, DEFAULT_WEIGHT,
};

#[doc(inline)]
pub use geom::{area, envelope, merge_fragments, BoundaryRule, SpatialIndex};

#[doc(inline)]
pub use join::{aggregate, Tally};

#[doc(inline)]
pub use layer::{compute_park_stats, ParkLayer, ParkStats};

#[doc(inline)]
pub use config::StatsConfig;

#[doc(inline)]
pub use error::StatsError;

#[doc(inline)]
pub use frame::{ReferenceFrame, Reprojector};

#[doc(inline)]
pub use report::{RunReport, Warning};

#[doc(inline)]
pub use io::*;
