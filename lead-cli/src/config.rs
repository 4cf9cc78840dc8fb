//! `lead-configurator.toml` loading.
//!
//! ```toml
//! [database]
//! backend = "json"
//! location = "leads.json"
//!
//! [retry]
//! max_attempts = 5
//!
//! [pricing]
//! variance = 0.10
//!
//! [pricing.rates_per_m2]
//! apartment = 58
//! ```
//!
//! Every section and key is optional and falls back to its default.

use std::path::{Path, PathBuf};

use lead_core::PricingPolicy;
use lead_core::calculations::PricingPolicyError;
use lead_core::db::{DbConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid pricing table")]
    Pricing(#[from] PricingPolicyError),

    #[error("retry.max_attempts must be at least 1")]
    NoAttempts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DbConfig,
    pub retry: RetryPolicy,
    pub pricing: PricingPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DbConfig::new("json", "leads.json"),
            retry: RetryPolicy::default(),
            pricing: PricingPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("no config file, using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        self.pricing.validate()?;
        Ok(())
    }

    /// Command-line database overrides win over the file.
    pub fn override_database(&mut self, backend: Option<String>, db: Option<PathBuf>) {
        if let Some(backend) = backend {
            self.database.backend = backend;
        }
        if let Some(db) = db {
            self.database.location = Some(db);
        }
    }
}
