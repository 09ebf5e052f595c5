//! Engine configuration via `exoquery.toml`
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock engine. Values are validated when loaded.

use serde::{Deserialize, Serialize};
use std::path::Path;

use exo_core::ResourceType;

use crate::dispatch::DEFAULT_BATCH_SIZE;
use crate::reader::DEFAULT_CHUNK_SIZE;
use crate::{Error, Result};

/// Config file name looked up by applications.
pub const CONFIG_FILE_NAME: &str = "exoquery.toml";

/// Engine configuration loaded from `exoquery.toml`.
///
/// # Example
///
/// ```toml
/// batch_size = 25
/// chunk_size = 212
/// listing_types = ["client", "dataport", "datarule", "dispatch"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Command sets per round trip for batched operations.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Points per resource per round for chunked reads.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Child types listed when building trees and listings.
    #[serde(default = "default_listing_types")]
    pub listing_types: Vec<ResourceType>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_listing_types() -> Vec<ResourceType> {
    ResourceType::ALL.to_vec()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            chunk_size: default_chunk_size(),
            listing_types: default_listing_types(),
        }
    }
}

impl EngineConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# exoquery engine configuration
#
# Command sets sent per round trip by batched operations (default: 25).
# Larger batches mean fewer round trips but longer requests.
batch_size = 25

# Points requested per resource per round by chunked reads (default: 212).
chunk_size = 212

# Child resource types listed by tree and listing operations.
listing_types = ["client", "dataport", "datarule", "dispatch"]
"#
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config {
                reason: "batch_size must be greater than 0".into(),
            });
        }
        if self.chunk_size == 0 {
            return Err(Error::Config {
                reason: "chunk_size must be greater than 0".into(),
            });
        }
        if self.listing_types.is_empty() {
            return Err(Error::Config {
                reason: "listing_types must name at least one type".into(),
            });
        }
        Ok(())
    }

    /// Read, parse and validate config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            reason: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| Error::Config {
            reason: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| Error::Config {
                reason: format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ),
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content).map_err(|e| Error::Config {
            reason: format!("Failed to write config file '{}': {}", path.display(), e),
        })
    }
}
