mod bbox;
mod derive;
mod index;
mod merge;
mod validate;

pub(crate) use derive::derive_attributes;
pub use derive::{area, envelope};
pub use index::{BoundaryRule, SpatialIndex};
pub use merge::merge_fragments;
