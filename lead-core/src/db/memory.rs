use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{LeadRepository, RepositoryError};
use crate::models::{Lead, LeadStatus, NewLead};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    leads: BTreeMap<i64, Lead>,
}

/// Process-local lead store; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct InMemoryLeadRepository {
    inner: RwLock<Inner>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let lead = Lead {
            id: inner.next_id,
            status: LeadStatus::New,
            form: lead.form,
            estimate: lead.estimate,
            created_at: now,
            updated_at: now,
        };
        inner.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn get_lead(&self, id: i64) -> Result<Lead, RepositoryError> {
        self.inner
            .read()
            .await
            .leads
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .leads
            .values()
            .filter(|lead| status.is_none_or(|s| lead.status == s))
            .cloned()
            .collect())
    }

    async fn update_lead_status(
        &self,
        id: i64,
        status: LeadStatus,
    ) -> Result<Lead, RepositoryError> {
        let mut inner = self.inner.write().await;
        let lead = inner.leads.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        lead.status = status;
        lead.updated_at = Utc::now();
        Ok(lead.clone())
    }

    async fn delete_lead(&self, id: i64) -> Result<(), RepositoryError> {
        self.inner
            .write()
            .await
            .leads
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// [`RepositoryFactory`] for the `"memory"` backend.
pub struct InMemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for InMemoryRepositoryFactory {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn open(&self, _config: &DbConfig) -> Result<Box<dyn LeadRepository>, RepositoryError> {
        Ok(Box::new(InMemoryLeadRepository::new()))
    }
}
