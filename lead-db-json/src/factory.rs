use async_trait::async_trait;
use lead_core::db::{DbConfig, RepositoryFactory};
use lead_core::{LeadRepository, RepositoryError};

use crate::repository::JsonFileLeadRepository;

/// [`RepositoryFactory`] for the `"json"` backend.
///
/// ```rust,no_run
/// use lead_core::db::{DbConfig, RepositoryRegistry};
/// use lead_db_json::JsonFileRepositoryFactory;
///
/// # async fn open() -> Result<(), lead_core::RepositoryError> {
/// let registry = RepositoryRegistry::new().with(JsonFileRepositoryFactory);
/// let leads = registry.open(&DbConfig::new("json", "leads.json")).await?;
/// # Ok(())
/// # }
/// ```
pub struct JsonFileRepositoryFactory;

#[async_trait]
impl RepositoryFactory for JsonFileRepositoryFactory {
    fn name(&self) -> &'static str {
        "json"
    }

    /// Opens the file at `config.location`. A missing file is created on
    /// the first write.
    async fn open(&self, config: &DbConfig) -> Result<Box<dyn LeadRepository>, RepositoryError> {
        let Some(path) = config
            .location
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
        else {
            return Err(RepositoryError::Configuration(
                "json backend needs a lead file location".to_string(),
            ));
        };
        let repo = JsonFileLeadRepository::open(path).await?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use lead_core::db::{DbConfig, RepositoryFactory};

    use super::JsonFileRepositoryFactory;
    use lead_core::RepositoryError;

    #[test]
    fn backend_name_is_json() {
        assert_eq!(JsonFileRepositoryFactory.name(), "json");
    }

    #[tokio::test]
    async fn opens_repository_for_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new("json", dir.path().join("leads.json"));

        let repo = JsonFileRepositoryFactory.open(&config).await.unwrap();

        assert!(repo.list_leads(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_location_is_rejected() {
        let config = DbConfig {
            backend: "json".to_string(),
            location: None,
        };

        let result = JsonFileRepositoryFactory.open(&config).await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }

    #[tokio::test]
    async fn empty_location_is_rejected() {
        let result = JsonFileRepositoryFactory.open(&DbConfig::new("json", "")).await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }
}
