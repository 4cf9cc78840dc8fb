use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use lead_core::{Lead, LeadRepository, LeadStatus, NewLead, RepositoryError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::document::{self, Document};

/// Lead store persisted as a single JSON document.
///
/// The whole document is kept in memory and rewritten on every change.
/// A change becomes visible only once it has reached the disk: a failed
/// write leaves both the file and the in-memory copy as they were.
pub struct JsonFileLeadRepository {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonFileLeadRepository {
    /// Opens the store at `path`, creating it on first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        let document = document::load(&path).await?;
        info!(path = %path.display(), leads = document.leads.len(), "opened lead file");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Applies `change` to a copy of the document, persists it, then
    /// publishes it.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Document) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut current = self.document.lock().await;
        let mut next = current.clone();
        let value = change(&mut next)?;
        document::store(&self.path, &next).await?;
        *current = next;
        Ok(value)
    }
}

#[async_trait]
impl LeadRepository for JsonFileLeadRepository {
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
        let saved = self
            .commit(|doc| {
                doc.next_id += 1;
                let now = Utc::now();
                let lead = Lead {
                    id: doc.next_id,
                    status: LeadStatus::New,
                    form: lead.form,
                    estimate: lead.estimate,
                    created_at: now,
                    updated_at: now,
                };
                doc.leads.push(lead.clone());
                Ok(lead)
            })
            .await?;
        debug!(lead_id = saved.id, "lead stored");
        Ok(saved)
    }

    async fn get_lead(&self, id: i64) -> Result<Lead, RepositoryError> {
        self.document
            .lock()
            .await
            .find(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, RepositoryError> {
        let doc = self.document.lock().await;
        let mut leads: Vec<Lead> = doc
            .leads
            .iter()
            .filter(|lead| status.is_none_or(|s| lead.status == s))
            .cloned()
            .collect();
        leads.sort_by_key(|lead| lead.id);
        Ok(leads)
    }

    async fn update_lead_status(
        &self,
        id: i64,
        status: LeadStatus,
    ) -> Result<Lead, RepositoryError> {
        self.commit(|doc| {
            let lead = doc.find_mut(id).ok_or(RepositoryError::NotFound)?;
            lead.status = status;
            lead.updated_at = Utc::now();
            Ok(lead.clone())
        })
        .await
    }

    async fn delete_lead(&self, id: i64) -> Result<(), RepositoryError> {
        self.commit(|doc| {
            let index = doc
                .leads
                .iter()
                .position(|lead| lead.id == id)
                .ok_or(RepositoryError::NotFound)?;
            doc.leads.remove(index);
            Ok(())
        })
        .await
    }
}
