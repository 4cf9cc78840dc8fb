use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Lead, LeadStatus, NewLead};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Lead not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RepositoryError {
    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Where finished wizard submissions go.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, RepositoryError>;

    async fn get_lead(&self, id: i64) -> Result<Lead, RepositoryError>;

    /// Leads ordered by id, optionally restricted to one tracker column.
    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, RepositoryError>;

    async fn update_lead_status(
        &self,
        id: i64,
        status: LeadStatus,
    ) -> Result<Lead, RepositoryError>;

    async fn delete_lead(&self, id: i64) -> Result<(), RepositoryError>;
}
