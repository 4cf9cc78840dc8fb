use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::FormState;

use super::registry::default_steps;
use super::step::{StepDefinition, StepId};

/// Errors raised by [`FlowEngine`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// A position outside the current active steps was used. The caller
    /// held a position across a state change without re-resolving it.
    #[error("position {position} is out of range for {len} active steps")]
    OutOfRange { position: usize, len: usize },

    /// The registry has no steps at all.
    #[error("step registry is empty")]
    EmptyRegistry,

    /// The same step id was registered twice.
    #[error("step '{0}' is registered more than once")]
    DuplicateStep(StepId),
}

/// Index into the *active* steps for a given form state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NavigationPosition(usize);

impl NavigationPosition {
    pub const START: Self = Self(0);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NavigationPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(NavigationPosition),
    /// Already on the last active step; position unchanged.
    AtEnd(NavigationPosition),
    /// Already on the first active step; position unchanged.
    AtStart(NavigationPosition),
}

impl Navigation {
    pub fn position(&self) -> NavigationPosition {
        match *self {
            Self::Moved(p) | Self::AtEnd(p) | Self::AtStart(p) => p,
        }
    }

    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

/// Decides which steps are active and moves through them.
///
/// The engine holds nothing but the registry: every method takes the form
/// state and a position and returns a new position.
#[derive(Debug, Clone)]
pub struct FlowEngine {
    steps: Vec<StepDefinition>,
}

impl FlowEngine {
    /// Creates an engine over `steps`, in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::EmptyRegistry`] for an empty list and
    /// [`FlowError::DuplicateStep`] if an id appears twice.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::EmptyRegistry);
        }
        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(step.id) {
                return Err(FlowError::DuplicateStep(step.id));
            }
        }
        Ok(Self { steps })
    }

    /// Every registered step, active or not.
    pub fn registry(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Registered steps whose predicate holds for `state`, in registry order.
    pub fn active_steps(&self, state: &FormState) -> Vec<&StepDefinition> {
        self.steps
            .iter()
            .filter(|step| step.is_applicable(state))
            .collect()
    }

    /// The step at `position` among the active steps.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::OutOfRange`] if `position` is past the end.
    pub fn current_step(
        &self,
        state: &FormState,
        position: NavigationPosition,
    ) -> Result<&StepDefinition, FlowError> {
        let active = self.active_steps(state);
        let len = active.len();
        active
            .get(position.index())
            .copied()
            .ok_or(FlowError::OutOfRange {
                position: position.index(),
                len,
            })
    }

    /// Advances one active step.
    ///
    /// Applicability is re-evaluated against `state`, so an answer given on
    /// the step being left is already reflected in what comes next.
    pub fn go_to_next(
        &self,
        state: &FormState,
        position: NavigationPosition,
    ) -> Result<Navigation, FlowError> {
        let len = self.checked_len(state, position)?;
        let next = position.index() + 1;
        if next < len {
            debug!(from = position.index(), to = next, "advanced to next step");
            Ok(Navigation::Moved(NavigationPosition(next)))
        } else {
            debug!(position = position.index(), "already at last step");
            Ok(Navigation::AtEnd(position))
        }
    }

    /// Steps back one active step.
    pub fn go_to_back(
        &self,
        state: &FormState,
        position: NavigationPosition,
    ) -> Result<Navigation, FlowError> {
        self.checked_len(state, position)?;
        match position.index() {
            0 => Ok(Navigation::AtStart(position)),
            index => {
                debug!(from = index, to = index - 1, "stepped back");
                Ok(Navigation::Moved(NavigationPosition(index - 1)))
            }
        }
    }

    pub fn reset(&self) -> NavigationPosition {
        NavigationPosition::START
    }

    /// Position of `id` among the active steps, if it is active.
    pub fn position_of(&self, state: &FormState, id: StepId) -> Option<NavigationPosition> {
        self.active_steps(state)
            .iter()
            .position(|step| step.id == id)
            .map(NavigationPosition)
    }

    /// Carries `position` over a state change.
    ///
    /// The step shown under `before` keeps being shown if it is still active
    /// under `after`. Otherwise the nearest active step preceding it in
    /// registry order is chosen, or the first step when none precedes it.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::OutOfRange`] if `position` is invalid for `before`.
    pub fn resolve(
        &self,
        before: &FormState,
        after: &FormState,
        position: NavigationPosition,
    ) -> Result<NavigationPosition, FlowError> {
        let current = self.current_step(before, position)?.id;
        if let Some(p) = self.position_of(after, current) {
            return Ok(p);
        }

        let registry_index = self
            .steps
            .iter()
            .position(|step| step.id == current)
            .unwrap_or(0);
        let fallback = self.steps[..registry_index]
            .iter()
            .filter(|step| step.is_applicable(after))
            .count()
            .saturating_sub(1);
        debug!(step = %current, fallback, "current step became inactive");
        Ok(NavigationPosition(fallback))
    }

    fn checked_len(
        &self,
        state: &FormState,
        position: NavigationPosition,
    ) -> Result<usize, FlowError> {
        let len = self.active_steps(state).len();
        if position.index() >= len {
            return Err(FlowError::OutOfRange {
                position: position.index(),
                len,
            });
        }
        Ok(len)
    }
}

impl Default for FlowEngine {
    fn default() -> Self {
        Self {
            steps: default_steps(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{
        ConstructionStatus, ElectricalInfo, GeneralInfo, ModuleName, Service, SystemTier,
    };

    fn state(general: GeneralInfo, electrical: ElectricalInfo) -> FormState {
        FormState {
            general: Arc::new(general),
            electrical: Arc::new(electrical),
            ..Default::default()
        }
    }

    fn electrical_with_tier(tier: Option<SystemTier>) -> FormState {
        state(
            GeneralInfo {
                services: Some(vec![Service::Electrical]),
                ..Default::default()
            },
            ElectricalInfo {
                system_tier: tier,
                ..Default::default()
            },
        )
    }

    fn ids(steps: &[&StepDefinition]) -> Vec<StepId> {
        steps.iter().map(|s| s.id).collect()
    }

    // =========================================================================
    // construction
    // =========================================================================

    #[test]
    fn new_rejects_empty_registry() {
        assert_eq!(FlowEngine::new(Vec::new()).unwrap_err(), FlowError::EmptyRegistry);
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let steps = vec![
            StepDefinition::new(StepId::Contact, ModuleName::Contact),
            StepDefinition::new(StepId::Contact, ModuleName::Contact),
        ];

        assert_eq!(
            FlowEngine::new(steps).unwrap_err(),
            FlowError::DuplicateStep(StepId::Contact)
        );
    }

    // =========================================================================
    // active_steps
    // =========================================================================

    #[test]
    fn empty_state_shows_unconditional_steps_only() {
        let engine = FlowEngine::default();

        let active = engine.active_steps(&FormState::default());

        assert_eq!(
            ids(&active),
            vec![
                StepId::DwellingType,
                StepId::SurfaceArea,
                StepId::ConstructionStatus,
                StepId::RoomCount,
                StepId::Services,
                StepId::Contact,
                StepId::Estimate,
            ]
        );
    }

    #[test]
    fn renovation_enables_scope_step() {
        let engine = FlowEngine::default();
        let state = state(
            GeneralInfo {
                construction: Some(ConstructionStatus::Renovation),
                ..Default::default()
            },
            ElectricalInfo::default(),
        );

        let active = ids(&engine.active_steps(&state));

        assert_eq!(active[3], StepId::RenovationScope);
    }

    #[test]
    fn domotic_tier_hides_shutter_step() {
        let engine = FlowEngine::default();

        let advanced = ids(&engine.active_steps(&electrical_with_tier(Some(SystemTier::Advanced))));
        let domotic = ids(&engine.active_steps(&electrical_with_tier(Some(SystemTier::Domotic))));

        assert!(advanced.contains(&StepId::ShutterElectrification));
        assert!(!domotic.contains(&StepId::ShutterElectrification));
        assert!(domotic.contains(&StepId::ElectricalTier));
    }

    #[test]
    fn active_steps_is_repeatable() {
        let engine = FlowEngine::default();
        let state = electrical_with_tier(Some(SystemTier::Standard));

        assert_eq!(engine.active_steps(&state), engine.active_steps(&state));
    }

    // =========================================================================
    // current_step
    // =========================================================================

    #[test]
    fn current_step_reports_out_of_range() {
        let engine = FlowEngine::default();

        let err = engine
            .current_step(&FormState::default(), NavigationPosition::new(7))
            .unwrap_err();

        assert_eq!(err, FlowError::OutOfRange { position: 7, len: 7 });
    }

    // =========================================================================
    // navigation
    // =========================================================================

    #[test]
    fn next_from_tier_skips_shutters_for_domotic_and_back_returns() {
        let engine = FlowEngine::default();
        let state = electrical_with_tier(Some(SystemTier::Domotic));
        let tier = engine.position_of(&state, StepId::ElectricalTier).unwrap();

        let next = engine.go_to_next(&state, tier).unwrap();
        let landed = engine.current_step(&state, next.position()).unwrap();
        let back = engine.go_to_back(&state, next.position()).unwrap();

        assert_eq!(landed.id, StepId::Contact);
        assert_eq!(back, Navigation::Moved(tier));
    }

    #[test]
    fn next_at_last_step_signals_end() {
        let engine = FlowEngine::default();
        let state = FormState::default();
        let last = NavigationPosition::new(engine.active_steps(&state).len() - 1);

        assert_eq!(engine.go_to_next(&state, last).unwrap(), Navigation::AtEnd(last));
    }

    #[test]
    fn back_at_first_step_signals_start() {
        let engine = FlowEngine::default();

        let nav = engine
            .go_to_back(&FormState::default(), NavigationPosition::START)
            .unwrap();

        assert_eq!(nav, Navigation::AtStart(NavigationPosition::START));
    }

    #[test]
    fn navigation_rejects_stale_positions() {
        let engine = FlowEngine::default();
        let stale = NavigationPosition::new(40);

        assert!(matches!(
            engine.go_to_next(&FormState::default(), stale),
            Err(FlowError::OutOfRange { position: 40, .. })
        ));
        assert!(matches!(
            engine.go_to_back(&FormState::default(), stale),
            Err(FlowError::OutOfRange { position: 40, .. })
        ));
    }

    #[test]
    fn reset_returns_start() {
        assert_eq!(FlowEngine::default().reset(), NavigationPosition::START);
    }

    // =========================================================================
    // resolve
    // =========================================================================

    #[test]
    fn resolve_keeps_step_that_moved_slot() {
        let engine = FlowEngine::default();
        let before = FormState::default();
        let after = state(
            GeneralInfo {
                construction: Some(ConstructionStatus::Renovation),
                ..Default::default()
            },
            ElectricalInfo::default(),
        );
        let rooms_before = engine.position_of(&before, StepId::RoomCount).unwrap();

        let resolved = engine.resolve(&before, &after, rooms_before).unwrap();

        assert_eq!(engine.current_step(&after, resolved).unwrap().id, StepId::RoomCount);
        assert_eq!(resolved.index(), rooms_before.index() + 1);
    }

    #[test]
    fn resolve_falls_back_to_preceding_active_step() {
        let engine = FlowEngine::default();
        let before = electrical_with_tier(Some(SystemTier::Advanced));
        let after = electrical_with_tier(Some(SystemTier::Domotic));
        let shutters = engine
            .position_of(&before, StepId::ShutterElectrification)
            .unwrap();

        let resolved = engine.resolve(&before, &after, shutters).unwrap();

        assert_eq!(
            engine.current_step(&after, resolved).unwrap().id,
            StepId::ElectricalTier
        );
    }
}
