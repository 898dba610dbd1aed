//! Ledger configuration
//!
//! Loaded from a JSON file; every field has a default so partial files work.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::mining::DEFAULT_MEMPOOL_SIZE;

/// Default byte budget for a block's transactions
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 32 * 1024;

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Version byte for derived addresses
    pub address_version: u8,
    /// Byte budget for block candidates
    pub max_block_size: usize,
    /// Maximum pending transactions
    pub max_mempool_transactions: usize,
    /// Default log filter, overridden by RUST_LOG
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            address_version: 0,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            max_mempool_transactions: DEFAULT_MEMPOOL_SIZE,
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: LedgerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given and present, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_block_size == 0 {
            return Err(ConfigError::Invalid("max_block_size must be > 0".into()));
        }
        if self.max_mempool_transactions == 0 {
            return Err(ConfigError::Invalid(
                "max_mempool_transactions must be > 0".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }
}
