use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::geom::BoundaryRule;

/// Options controlling one statistics run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Point property holding the weight (bench seating capacity).
    pub weight_attribute: String,
    /// Feature property holding the label (park or bench name).
    pub label_attribute: String,
    /// Classification of points lying exactly on a park boundary.
    pub boundary_rule: BoundaryRule,
    /// Optional clip `[min_x, min_y, max_x, max_y]` in the working frame.
    pub extent: Option<[f64; 4]>,
    /// Merge groups and join points on the rayon thread pool.
    pub parallel: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            weight_attribute: "capacity".into(),
            label_attribute: "name".into(),
            boundary_rule: BoundaryRule::Inclusive,
            extent: None,
            parallel: true,
        }
    }
}

impl StatsConfig {
    /// Parse a config from a JSON string; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .context("[config] Failed to parse stats config JSON")?;
        config.check()?;
        Ok(config)
    }

    /// Read a config from a JSON file at `path`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read config file: {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// The configured extent as a rectangle, if any.
    pub fn extent_rect(&self) -> Option<Rect<f64>> {
        self.extent.map(|[min_x, min_y, max_x, max_y]| Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        ))
    }

    fn check(&self) -> Result<()> {
        if let Some([min_x, min_y, max_x, max_y]) = self.extent {
            ensure!(
                [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()),
                "[config] extent must be finite, got {:?}", self.extent,
            );
            ensure!(
                min_x < max_x && min_y < max_y,
                "[config] extent must be [min_x, min_y, max_x, max_y] with min < max, got {:?}", self.extent,
            );
        }
        ensure!(!self.weight_attribute.is_empty(), "[config] weight_attribute must not be empty");
        Ok(())
    }
}
