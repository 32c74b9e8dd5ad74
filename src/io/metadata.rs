use std::{collections::BTreeMap, fs, path::Path, time::{SystemTime, UNIX_EPOCH}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{config::StatsConfig, layer::ParkStats};

/// Summary written next to the generated files of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub created_at: u64, // Seconds since the Unix epoch
    pub frame: u32,      // EPSG code of the working frame
    pub extent: Option<[f64; 4]>,
    pub fragments_read: usize,
    pub fragments_skipped: usize,
    pub parks: usize,
    pub points: usize,
    pub files: BTreeMap<String, String>, // Output kind -> file name
}

impl RunMetadata {
    pub fn new(stats: &ParkStats, config: &StatsConfig) -> Self {
        Self {
            created_at: SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default(),
            frame: stats.frame.epsg(),
            extent: config.extent,
            fragments_read: stats.report.fragments_in,
            fragments_skipped: stats.report.fragments_skipped,
            parks: stats.records.len(),
            points: stats.points.len(),
            files: BTreeMap::new(),
        }
    }

    /// Register an output file under `kind` (e.g. `"park_stats"`).
    pub fn with_file(mut self, kind: &str, name: &str) -> Self {
        self.files.insert(kind.to_string(), name.to_string());
        self
    }

    /// Write pretty-printed JSON to `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("[io::metadata] Failed to serialize run metadata")?;
        fs::write(path, json)
            .with_context(|| format!("[io::metadata] Failed to write metadata file: {}", path.display()))
    }
}
