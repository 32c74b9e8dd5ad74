use thiserror::Error;

use crate::{frame::ReferenceFrame, types::FeatureKey};

/// Errors raised by the merge / index / join stages.
///
/// Per-fragment geometry faults are recovered by the caller and recorded in
/// the run report; the remaining variants abort the run before any output.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A boundary is malformed or degenerate.
    #[error("invalid geometry for park {key}: {reason}")]
    InvalidGeometry { key: FeatureKey, reason: String },

    /// Fragments and points were supplied in different coordinate frames.
    #[error("reference frame mismatch: fragments are in {fragments}, points are in {points}")]
    ReferenceFrameMismatch { fragments: ReferenceFrame, points: ReferenceFrame },

    /// A containment join was requested before the spatial index was built.
    #[error("cannot aggregate points without a spatial index")]
    MissingIndex,

    /// A coordinate transform between frames failed.
    #[error("reprojection failed: {0}")]
    Reprojection(String),
}
