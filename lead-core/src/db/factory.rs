//! Choosing where submitted leads are kept.
//!
//! The binary ships a fixed set of lead stores. Each store crate exposes a
//! [`RepositoryFactory`]; the binary collects them in a [`RepositoryRegistry`]
//! and opens whichever one the `[database]` section of its config names.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::repository::{LeadRepository, RepositoryError};

/// The `[database]` config section.
///
/// | backend  | location                               |
/// |----------|----------------------------------------|
/// | `memory` | unused; leads die with the process     |
/// | `json`   | lead file, created on the first save   |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            location: None,
        }
    }
}

impl DbConfig {
    pub fn new(backend: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            backend: backend.into(),
            location: Some(location.into()),
        }
    }
}

/// Opens one kind of lead store.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Value of `DbConfig::backend` that selects this store.
    fn name(&self) -> &'static str;

    async fn open(&self, config: &DbConfig) -> Result<Box<dyn LeadRepository>, RepositoryError>;
}

/// The lead stores a binary can open, by name.
#[derive(Default)]
pub struct RepositoryRegistry {
    stores: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`; a later store with the same name wins.
    pub fn with(mut self, factory: impl RepositoryFactory + 'static) -> Self {
        self.stores.insert(factory.name(), Box::new(factory));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stores.keys().copied().collect()
    }

    /// Opens the store `config.backend` names.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] for a name nothing registered,
    /// otherwise whatever the store reports while opening.
    pub async fn open(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn LeadRepository>, RepositoryError> {
        let Some(factory) = self.stores.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "no lead store named '{}' (known: {})",
                config.backend,
                self.names().join(", ")
            )));
        };
        factory.open(config).await
    }
}
