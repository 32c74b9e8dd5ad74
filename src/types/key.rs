use std::{fmt, sync::Arc};

/// Identity shared by every fragment of one logical park.
/// Two fragments belong to the same park iff both `id` and `label` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey {
    pub id: i64,
    pub label: Option<Arc<str>>, // Common name, e.g. "Central Park"
}

impl FeatureKey {
    pub fn new(id: i64, label: Option<&str>) -> Self {
        Self { id, label: label.map(Arc::from) }
    }

    #[inline] pub fn label(&self) -> Option<&str> { self.label.as_deref() }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({label})", self.id),
            None => write!(f, "{} (unnamed)", self.id),
        }
    }
}
