//! Store metadata (`_meta.json`)
//!
//! Carries the on-disk format version so older binaries refuse newer layouts

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use chrono::{DateTime, Utc};

use super::error::{Result, WideColumnError};

/// Current format version supported by this store
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Minimum format version we can read
pub const MIN_FORMAT_VERSION: u32 = 1;

pub const META_FILE: &str = "_meta.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub engine: String,
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
}

impl Meta {
    pub fn new() -> Self {
        Self {
            engine: "bolt-widecolumn".to_string(),
            format_version: CURRENT_FORMAT_VERSION,
            created_at: Utc::now(),
        }
    }

    /// Load meta from a store directory, rejecting unsupported formats
    pub fn load(base_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(base_path.join(META_FILE))?;
        let meta: Meta = serde_json::from_str(&content)?;

        if !(MIN_FORMAT_VERSION..=CURRENT_FORMAT_VERSION).contains(&meta.format_version) {
            return Err(WideColumnError::UnsupportedFormatVersion {
                found: meta.format_version,
                min: MIN_FORMAT_VERSION,
                max: CURRENT_FORMAT_VERSION,
            });
        }

        Ok(meta)
    }

    pub fn save(&self, base_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(base_path.join(META_FILE), content)?;
        Ok(())
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}
