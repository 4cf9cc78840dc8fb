use std::iter::Take;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

use super::repository::{LeadRepository, RepositoryError};
use crate::models::{Lead, NewLead};

/// Bounded retry around a lead save.
///
/// Retry `n` (1-based) waits `base_delay_ms × 2ⁿ`, capped at `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total calls including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
        }
    }
}

impl RetryPolicy {
    fn strategy(&self) -> Take<ExponentialBackoff> {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        ExponentialBackoff::from_millis(2)
            .factor(self.base_delay_ms.max(1))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .take(retries)
    }
}

/// Hands finished leads to a [`LeadRepository`], retrying transient failures.
pub struct LeadSubmitter<'a> {
    repository: &'a dyn LeadRepository,
    policy: RetryPolicy,
}

impl<'a> LeadSubmitter<'a> {
    pub fn new(repository: &'a dyn LeadRepository, policy: RetryPolicy) -> Self {
        Self { repository, policy }
    }

    /// Saves `lead`.
    ///
    /// # Errors
    ///
    /// Returns the last [`RepositoryError`] once attempts are exhausted, or
    /// the first non-transient one immediately.
    pub async fn submit(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
        let attempts = AtomicU32::new(0);
        let repository = self.repository;

        let saved = RetryIf::spawn(
            self.policy.strategy(),
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let lead = lead.clone();
                async move {
                    debug!(attempt, "saving lead");
                    repository.create_lead(lead).await
                }
            },
            |error: &RepositoryError| {
                let transient = error.is_transient();
                if transient {
                    warn!(%error, "lead save failed, retrying");
                }
                transient
            },
        )
        .await?;

        info!(
            lead_id = saved.id,
            attempts = attempts.load(Ordering::SeqCst),
            "lead saved"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::db::memory::InMemoryLeadRepository;
    use crate::models::{FormState, LeadStatus};
    use crate::EstimateCalculator;

    /// Fails the first `failures` saves with `error`, then delegates.
    struct FlakyRepository {
        failures: u32,
        error: fn() -> RepositoryError,
        calls: Arc<AtomicU32>,
        inner: InMemoryLeadRepository,
    }

    impl FlakyRepository {
        fn new(failures: u32, error: fn() -> RepositoryError) -> Self {
            Self {
                failures,
                error,
                calls: Arc::new(AtomicU32::new(0)),
                inner: InMemoryLeadRepository::new(),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LeadRepository for FlakyRepository {
        async fn create_lead(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error)());
            }
            self.inner.create_lead(lead).await
        }

        async fn get_lead(&self, id: i64) -> Result<Lead, RepositoryError> {
            self.inner.get_lead(id).await
        }

        async fn list_leads(
            &self,
            status: Option<LeadStatus>,
        ) -> Result<Vec<Lead>, RepositoryError> {
            self.inner.list_leads(status).await
        }

        async fn update_lead_status(
            &self,
            id: i64,
            status: LeadStatus,
        ) -> Result<Lead, RepositoryError> {
            self.inner.update_lead_status(id, status).await
        }

        async fn delete_lead(&self, id: i64) -> Result<(), RepositoryError> {
            self.inner.delete_lead(id).await
        }
    }

    fn connection_lost() -> RepositoryError {
        RepositoryError::Connection("connection reset".to_string())
    }

    fn disk_full() -> RepositoryError {
        RepositoryError::Database("disk full".to_string())
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    fn new_lead() -> NewLead {
        let form: FormState = serde_json::from_value(json!({
            "general": { "dwellingType": "townhouse", "surfaceArea": 110 }
        }))
        .unwrap();
        let estimate = EstimateCalculator::default().compute(&form).unwrap();
        NewLead { form, estimate }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let repo = FlakyRepository::new(2, connection_lost);

        let lead = LeadSubmitter::new(&repo, fast_policy(3))
            .submit(new_lead())
            .await
            .unwrap();

        assert_eq!(lead.id, 1);
        assert_eq!(repo.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let repo = FlakyRepository::new(10, connection_lost);

        let result = LeadSubmitter::new(&repo, fast_policy(3))
            .submit(new_lead())
            .await;

        assert!(matches!(result, Err(RepositoryError::Connection(_))));
        assert_eq!(repo.calls(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let repo = FlakyRepository::new(1, disk_full);

        let result = LeadSubmitter::new(&repo, fast_policy(5))
            .submit(new_lead())
            .await;

        assert!(matches!(result, Err(RepositoryError::Database(_))));
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn single_attempt_policy_never_retries() {
        let repo = FlakyRepository::new(1, connection_lost);

        let result = LeadSubmitter::new(&repo, fast_policy(1))
            .submit(new_lead())
            .await;

        assert!(result.is_err());
        assert_eq!(repo.calls(), 1);
    }
}
