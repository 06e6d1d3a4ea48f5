//! Store configuration: tunables the engine would otherwise hardcode,
//! loaded once at process start and consulted by [`crate::database::Db::open`]
//! and the diagnostic CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::btree::DEFAULT_CHUNK_THRESHOLD;
use crate::database::OpenOptions;

/// Loaded from an optional TOML file; every field has a sensible
/// default so a missing file is never an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Node-chunk split threshold in bytes.
    pub chunk_threshold: usize,
    /// Default map-function timeout in milliseconds, applied
    /// at process start; `mapreduce_set_timeout` overrides it at runtime.
    pub map_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { chunk_threshold: DEFAULT_CHUNK_THRESHOLD, map_timeout_ms: 5_000 }
    }
}

impl StoreConfig {
    /// Loads configuration from `path`, falling back to defaults for any
    /// field the file omits.
    ///
    /// # Errors
    /// Returns an error if `path` exists but is not valid TOML, or if it
    /// cannot be read for a reason other than not existing.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Builds the [`OpenOptions`] this configuration implies for opening an
    /// existing store (`create: false`); callers that need to create a new
    /// file should override `create` on the returned value.
    #[must_use]
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions { create: false, chunk_threshold: self.chunk_threshold }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = StoreConfig::load(Path::new("/nonexistent/seqstore.toml")).unwrap();
        assert_eq!(cfg.chunk_threshold, DEFAULT_CHUNK_THRESHOLD);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults_for_missing_fields() {
        let cfg: StoreConfig = toml::from_str("chunk_threshold = 2048").unwrap();
        assert_eq!(cfg.chunk_threshold, 2048);
        assert_eq!(cfg.map_timeout_ms, StoreConfig::default().map_timeout_ms);
    }

    #[test]
    fn open_options_carries_the_configured_chunk_threshold_and_never_creates() {
        let cfg: StoreConfig = toml::from_str("chunk_threshold = 4096").unwrap();
        let opts = cfg.open_options();
        assert_eq!(opts.chunk_threshold, 4096);
        assert!(!opts.create);
    }
}
