use std::fmt;

use crate::types::FeatureKey;

/// A recovered, non-fatal condition observed during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A fragment boundary failed validation and was dropped from its group.
    InvalidFragment { key: FeatureKey, reason: String },
    /// The union of a group's fragments produced no polygonal area.
    DegenerateUnion { key: FeatureKey },
    /// The fragment source produced no features.
    EmptyFragments,
    /// The point source produced no features.
    EmptyPoints,
    /// Features discarded because they fell outside the configured extent.
    OutsideExtent { fragments: usize, points: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidFragment { key, reason } => write!(f, "dropped fragment of park {key}: {reason}"),
            Warning::DegenerateUnion { key } => write!(f, "union of park {key} has no polygonal area"),
            Warning::EmptyFragments => write!(f, "fragment source is empty"),
            Warning::EmptyPoints => write!(f, "point source is empty"),
            Warning::OutsideExtent { fragments, points } =>
                write!(f, "{fragments} fragments and {points} points lie outside the extent"),
        }
    }
}

/// Run-level summary of what was read, produced and skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub fragments_in: usize, // As read from the source, before any extent clip
    pub fragments_skipped: usize,
    pub points_in: usize,    // As read from the source, before any extent clip
    pub canonical_polygons: usize,
    pub warnings: Vec<Warning>,
}

impl RunReport {
    /// Record a warning and forward it to the logger.
    pub(crate) fn warn(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Fold another report's counts and warnings into this one.
    pub(crate) fn absorb(&mut self, other: RunReport) {
        self.fragments_in += other.fragments_in;
        self.fragments_skipped += other.fragments_skipped;
        self.points_in += other.points_in;
        self.canonical_polygons += other.canonical_polygons;
        self.warnings.extend(other.warnings);
    }

    /// Number of groups lost because their union was degenerate.
    pub fn degenerate_unions(&self) -> usize {
        self.warnings.iter()
            .filter(|w| matches!(w, Warning::DegenerateUnion { .. }))
            .count()
    }

    #[inline] pub fn has_warnings(&self) -> bool { !self.warnings.is_empty() }
}
