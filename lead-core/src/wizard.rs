//! A single customer's pass through the configurator.
//!
//! [`WizardSession`] is the owner of the mutable parts: the current
//! snapshot, the position and the last estimate. Everything it delegates to
//! ([`FlowEngine`], [`FormStateStore`], [`EstimateCalculator`]) is pure.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculations::{EstimateCalculator, EstimateError, RequiredField};
use crate::flow::{FlowEngine, FlowError, Navigation, NavigationPosition, StepDefinition, StepId};
use crate::form::{FormPatch, FormStateStore, PatchError};
use crate::models::{EstimateResult, FormState, NewLead};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),

    /// The estimate step was reached without a required answer. The session
    /// has moved to `routed_to`, the step collecting it.
    #[error("cannot estimate yet: {missing} is missing, returning to '{routed_to}'")]
    CannotEstimate {
        missing: RequiredField,
        routed_to: StepId,
    },

    /// `finalize` was called before reaching the estimate step.
    #[error("lead can only be finalized on the estimate step, current step is '{0}'")]
    NotAtEstimate(StepId),

    #[error("an email address or phone number is required")]
    MissingContact,

    #[error("privacy consent is required to submit a lead")]
    ConsentRequired,
}

/// Wizard state for one customer.
#[derive(Debug, Clone)]
pub struct WizardSession {
    engine: FlowEngine,
    calculator: EstimateCalculator,
    store: FormStateStore,
    position: NavigationPosition,
    estimate: Option<EstimateResult>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new(FlowEngine::default(), EstimateCalculator::default())
    }
}

impl WizardSession {
    pub fn new(engine: FlowEngine, calculator: EstimateCalculator) -> Self {
        Self {
            position: engine.reset(),
            engine,
            calculator,
            store: FormStateStore::new(),
            estimate: None,
        }
    }

    pub fn position(&self) -> NavigationPosition {
        self.position
    }

    pub fn state(&self) -> Arc<FormState> {
        self.store.current()
    }

    pub fn active_steps(&self) -> Vec<&StepDefinition> {
        self.engine.active_steps(&self.store.current())
    }

    pub fn current_step(&self) -> Result<&StepDefinition, FlowError> {
        self.engine
            .current_step(&self.store.current(), self.position)
    }

    /// Estimate computed when the estimate step was reached, if still valid.
    pub fn estimate(&self) -> Option<&EstimateResult> {
        self.estimate.as_ref()
    }

    /// Live estimate of the answers so far, for a progress summary.
    pub fn preview_estimate(&self) -> Result<EstimateResult, EstimateError> {
        self.calculator.compute(&self.store.current())
    }

    /// Records the answers of the current step and moves forward.
    ///
    /// # Errors
    ///
    /// * [`WizardError::CannotEstimate`] when the step reached needs an
    ///   estimate that cannot be computed. The session is then positioned on
    ///   the step collecting the missing answer.
    /// * [`WizardError::Estimate`] when an answer is too large to price.
    /// * [`WizardError::Flow`] if the position is invalid.
    pub fn submit(&mut self, patch: &FormPatch) -> Result<Navigation, WizardError> {
        let before = self.store.current();
        let after = self.store.update(patch);
        self.estimate = None;

        let position = self.engine.resolve(&before, &after, self.position)?;
        let navigation = self.engine.go_to_next(&after, position)?;
        self.position = navigation.position();

        let step = self.engine.current_step(&after, self.position)?;
        let requires_estimate = step.requires_estimate;
        debug!(step = %step.id, position = %self.position, "wizard moved");
        if requires_estimate {
            self.refresh_estimate(&after)?;
        }
        Ok(navigation)
    }

    /// [`submit`](Self::submit) for a loosely-typed patch document.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Patch`] without touching the session when the
    /// document is malformed.
    pub fn submit_json(&mut self, patch: &Value) -> Result<Navigation, WizardError> {
        let patch = FormPatch::from_json(patch)?;
        self.submit(&patch)
    }

    pub fn back(&mut self) -> Result<Navigation, WizardError> {
        let navigation = self
            .engine
            .go_to_back(&self.store.current(), self.position)?;
        self.position = navigation.position();
        Ok(navigation)
    }

    pub fn restart(&mut self) {
        self.store.reset();
        self.position = self.engine.reset();
        self.estimate = None;
        debug!("wizard restarted");
    }

    /// Packages the answers and their estimate for persistence.
    ///
    /// # Errors
    ///
    /// * [`WizardError::NotAtEstimate`] before the estimate step.
    /// * [`WizardError::MissingContact`] / [`WizardError::ConsentRequired`]
    ///   when the contact step is incomplete.
    /// * [`WizardError::Estimate`] if the estimate cannot be computed.
    pub fn finalize(&self) -> Result<NewLead, WizardError> {
        let step = self.current_step()?;
        if !step.requires_estimate {
            return Err(WizardError::NotAtEstimate(step.id));
        }

        let form = self.store.current();
        if !form.contact.has_channel() {
            return Err(WizardError::MissingContact);
        }
        if form.contact.privacy_consent != Some(true) {
            return Err(WizardError::ConsentRequired);
        }

        let estimate = match &self.estimate {
            Some(estimate) => estimate.clone(),
            None => self.calculator.compute(&form)?,
        };
        info!(midpoint = %estimate.midpoint, "lead finalized");
        Ok(NewLead {
            form: (*form).clone(),
            estimate,
        })
    }

    fn refresh_estimate(&mut self, state: &FormState) -> Result<(), WizardError> {
        match self.calculator.compute(state) {
            Ok(estimate) => {
                self.estimate = Some(estimate);
                Ok(())
            }
            Err(EstimateError::IncompleteInput(missing)) => {
                let routed_to = missing.answered_by();
                warn!(%missing, step = %routed_to, "estimate unavailable, routing back");
                if let Some(position) = self.engine.position_of(state, routed_to) {
                    self.position = position;
                }
                Err(WizardError::CannotEstimate { missing, routed_to })
            }
            Err(err) => Err(err.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::CostComponent;

    fn current(session: &WizardSession) -> StepId {
        session.current_step().unwrap().id
    }

    fn answer(session: &mut WizardSession, patch: Value) -> Navigation {
        session.submit_json(&patch).unwrap()
    }

    /// Walks dwelling type through the services step.
    fn answer_general(session: &mut WizardSession, services: Value) {
        answer(session, json!({ "general": { "dwellingType": "apartment" } }));
        answer(session, json!({ "general": { "surfaceArea": 85 } }));
        answer(session, json!({ "general": { "construction": "new_build" } }));
        answer(session, json!({ "general": { "roomCount": 4 } }));
        answer(session, json!({ "general": { "services": services } }));
    }

    fn contact() -> Value {
        json!({ "contact": {
            "fullName": "Giulia Conti",
            "email": "giulia@example.com",
            "privacyConsent": true
        } })
    }

    #[test]
    fn starts_on_first_step() {
        let session = WizardSession::default();

        assert_eq!(current(&session), StepId::DwellingType);
        assert_eq!(session.position(), NavigationPosition::START);
    }

    #[test]
    fn domotic_tier_goes_straight_to_contact_and_back() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!(["electrical"]));
        assert_eq!(current(&session), StepId::ElectricalTier);

        answer(&mut session, json!({ "electrical": { "systemTier": "domotic" } }));
        assert_eq!(current(&session), StepId::Contact);

        session.back().unwrap();
        assert_eq!(current(&session), StepId::ElectricalTier);
    }

    #[test]
    fn advanced_tier_asks_about_shutters() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!(["electrical"]));

        answer(&mut session, json!({ "electrical": { "systemTier": "advanced" } }));

        assert_eq!(current(&session), StepId::ShutterElectrification);
    }

    #[test]
    fn reaching_estimate_step_computes_estimate() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!([]));
        assert_eq!(current(&session), StepId::Contact);

        let nav = answer(&mut session, contact());

        assert!(nav.moved());
        assert_eq!(current(&session), StepId::Estimate);
        let estimate = session.estimate().unwrap();
        assert!(estimate.min <= estimate.max);
    }

    #[test]
    fn submit_on_earlier_step_discards_estimate() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!([]));
        answer(&mut session, contact());
        assert!(session.estimate().is_some());

        session.back().unwrap();
        session.back().unwrap();
        assert_eq!(current(&session), StepId::Services);
        answer(&mut session, json!({ "general": { "services": [] } }));

        assert_eq!(current(&session), StepId::Contact);
        assert!(session.estimate().is_none());
    }

    #[test]
    fn estimate_reflects_latest_answers() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!([]));
        answer(&mut session, contact());
        let first = session.estimate().unwrap().midpoint;

        session.back().unwrap();
        answer(&mut session, json!({ "general": { "surfaceArea": 120 } }));

        assert_eq!(current(&session), StepId::Estimate);
        assert!(session.estimate().unwrap().midpoint > first);
    }

    #[test]
    fn next_on_estimate_step_stays_put() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!([]));
        answer(&mut session, contact());
        let position = session.position();

        let nav = answer(&mut session, json!({}));

        assert_eq!(nav, Navigation::AtEnd(position));
        assert!(session.estimate().is_some());
    }

    #[test]
    fn missing_surface_routes_back_to_its_step() {
        let mut session = WizardSession::default();
        answer(&mut session, json!({ "general": { "dwellingType": "office" } }));
        answer(&mut session, json!({}));
        answer(&mut session, json!({}));
        answer(&mut session, json!({}));
        answer(&mut session, json!({}));
        assert_eq!(current(&session), StepId::Contact);

        let err = session.submit_json(&contact()).unwrap_err();

        assert!(matches!(
            err,
            WizardError::CannotEstimate {
                missing: RequiredField::SurfaceArea,
                routed_to: StepId::SurfaceArea
            }
        ));
        assert_eq!(current(&session), StepId::SurfaceArea);
        assert!(session.estimate().is_none());
    }

    #[test]
    fn unpriceable_surface_is_an_error_not_a_panic() {
        let mut session = WizardSession::default();
        answer(&mut session, json!({ "general": { "dwellingType": "apartment" } }));
        answer(
            &mut session,
            json!({ "general": { "surfaceArea": "79228162514264337593543950335" } }),
        );
        answer(&mut session, json!({}));
        answer(&mut session, json!({}));
        answer(&mut session, json!({ "general": { "services": [] } }));

        let err = session.submit_json(&contact()).unwrap_err();

        assert!(matches!(
            err,
            WizardError::Estimate(EstimateError::AmountOutOfRange(CostComponent::BaseArea))
        ));
        assert!(session.estimate().is_none());
    }

    #[test]
    fn malformed_patch_leaves_session_untouched() {
        let mut session = WizardSession::default();
        let before = session.state();

        let err = session.submit_json(&json!("apartment")).unwrap_err();

        assert!(matches!(err, WizardError::Patch(PatchError::NotAMapping(_))));
        assert!(Arc::ptr_eq(&before, &session.state()));
        assert_eq!(session.position(), NavigationPosition::START);
    }

    #[test]
    fn finalize_requires_estimate_step() {
        let session = WizardSession::default();

        assert!(matches!(
            session.finalize(),
            Err(WizardError::NotAtEstimate(StepId::DwellingType))
        ));
    }

    #[test]
    fn finalize_requires_consent() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!([]));
        answer(&mut session, json!({ "contact": { "email": "a@b.it" } }));

        assert!(matches!(session.finalize(), Err(WizardError::ConsentRequired)));
    }

    #[test]
    fn finalize_requires_contact_channel() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!([]));
        answer(&mut session, json!({ "contact": { "privacyConsent": true } }));

        assert!(matches!(session.finalize(), Err(WizardError::MissingContact)));
    }

    #[test]
    fn finalize_hands_over_state_and_estimate() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!(["security"]));
        answer(&mut session, json!({ "security": { "alarm": "combined" } }));
        answer(&mut session, json!({ "security": { "cameraCount": 2 } }));
        answer(&mut session, contact());

        let lead = session.finalize().unwrap();

        assert_eq!(lead.form, *session.state());
        assert_eq!(Some(&lead.estimate), session.estimate());
    }

    #[test]
    fn restart_clears_everything() {
        let mut session = WizardSession::default();
        answer_general(&mut session, json!(["photovoltaic"]));

        session.restart();

        assert!(session.state().is_empty());
        assert_eq!(current(&session), StepId::DwellingType);
        assert!(session.estimate().is_none());
    }

    #[test]
    fn preview_follows_answers() {
        let mut session = WizardSession::default();
        assert!(session.preview_estimate().is_err());

        answer(&mut session, json!({ "general": { "dwellingType": "apartment" } }));
        answer(&mut session, json!({ "general": { "surfaceArea": 40 } }));

        assert!(session.preview_estimate().is_ok());
    }
}
