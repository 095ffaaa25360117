//! Configuration module
//!
//! Handles loading of converter configuration files (recordmap.toml, and the
//! legacy json2typescript.json).

pub mod legacy;
pub mod model;

use anyhow::Context;
use std::path::Path;

use self::legacy::LegacyOptions;

pub use self::model::*;

impl RecordmapConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        // Detect format based on extension
        if path.extension().is_some_and(|ext| ext == "json") {
            let legacy: LegacyOptions = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            return legacy.try_into();
        }

        // Default to TOML
        let config: RecordmapConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }
}
