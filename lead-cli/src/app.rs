//! Command implementations. Each returns the text to print on stdout.

use anyhow::{Context, Result};
use lead_core::db::{DbConfig, InMemoryRepositoryFactory, LeadSubmitter, RepositoryRegistry};
use lead_core::{EstimateCalculator, FlowEngine, LeadRepository, LeadStatus, WizardSession};
use lead_db_json::JsonFileRepositoryFactory;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::report::{EstimateReport, LeadDetail, LeadTable, StepList, Trace};
use crate::script::Script;

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    RepositoryRegistry::new()
        .with(InMemoryRepositoryFactory)
        .with(JsonFileRepositoryFactory)
}

pub async fn open_repository(config: &DbConfig) -> Result<Box<dyn LeadRepository>> {
    debug!(backend = %config.backend, "opening lead store");
    build_registry()
        .open(config)
        .await
        .with_context(|| format!("cannot open '{}' lead store", config.backend))
}

fn calculator(config: &AppConfig) -> Result<EstimateCalculator> {
    EstimateCalculator::new(config.pricing.clone()).context("invalid pricing table")
}

/// Active steps once every answer in the script is applied.
pub fn steps(script: &Script) -> Result<String> {
    let state = script.merged_state()?;
    let engine = FlowEngine::default();
    let steps = engine.active_steps(&state);
    Ok(StepList {
        steps: &steps,
        current: None,
    }
    .to_string())
}

pub fn estimate(config: &AppConfig, script: &Script, json: bool) -> Result<String> {
    let state = script.merged_state()?;
    let estimate = calculator(config)?
        .compute(&state)
        .context("answers are not enough for an estimate")?;
    if json {
        let mut text = serde_json::to_string_pretty(&estimate)?;
        text.push('\n');
        return Ok(text);
    }
    Ok(EstimateReport(&estimate).to_string())
}

/// Replays `script` step by step; with `submit`, saves the finished lead.
pub async fn run(config: &AppConfig, script: &Script, submit: bool) -> Result<String> {
    let mut session = WizardSession::new(FlowEngine::default(), calculator(config)?);
    let trace = script.replay(&mut session)?;

    let mut out = Trace(&trace).to_string();
    let steps = session.active_steps();
    let current = session.current_step()?.id;
    out.push_str(
        &StepList {
            steps: &steps,
            current: Some(current),
        }
        .to_string(),
    );

    match session.estimate() {
        Some(estimate) => out.push_str(&EstimateReport(estimate).to_string()),
        None => out.push_str("No estimate yet: the estimate step was not reached.\n"),
    }

    if submit {
        let lead = session
            .finalize()
            .context("the session cannot be submitted")?;
        let repository = open_repository(&config.database).await?;
        let saved = LeadSubmitter::new(&*repository, config.retry.clone())
            .submit(lead)
            .await
            .context("failed to save the lead")?;
        info!(lead_id = saved.id, "lead submitted");
        out.push_str(&format!("Saved lead #{}\n", saved.id));
    }
    Ok(out)
}

pub async fn list_leads(config: &AppConfig, status: Option<LeadStatus>) -> Result<String> {
    let repository = open_repository(&config.database).await?;
    let leads = repository.list_leads(status).await?;
    Ok(LeadTable(&leads).to_string())
}

pub async fn show_lead(config: &AppConfig, id: i64) -> Result<String> {
    let repository = open_repository(&config.database).await?;
    let lead = repository
        .get_lead(id)
        .await
        .with_context(|| format!("lead #{id}"))?;
    Ok(LeadDetail(&lead).to_string())
}

pub async fn move_lead(config: &AppConfig, id: i64, status: LeadStatus) -> Result<String> {
    let repository = open_repository(&config.database).await?;
    let lead = repository
        .update_lead_status(id, status)
        .await
        .with_context(|| format!("lead #{id}"))?;
    Ok(format!("Lead #{} is now {}\n", lead.id, lead.status.as_str()))
}
