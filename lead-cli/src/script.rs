//! Scripted wizard sessions.
//!
//! A script is a JSON array. Each entry is either a patch object (the
//! answers given on the current step, followed by "next") or one of the
//! commands `"back"` and `"restart"`:
//!
//! ```json
//! [
//!   { "general": { "dwellingType": "apartment" } },
//!   { "general": { "surfaceArea": 85 } },
//!   "back",
//!   { "general": { "surfaceArea": 90 } }
//! ]
//! ```

use std::path::{Path, PathBuf};

use lead_core::{FormPatch, FormState, Navigation, PatchError, StepId, WizardError, WizardSession};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read answers file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("answers file '{path}' is not a JSON array of entries")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("entry {index}: invalid answers")]
    Patch {
        index: usize,
        #[source]
        source: PatchError,
    },

    #[error("entry {index}: wizard error")]
    Wizard {
        index: usize,
        #[source]
        source: WizardError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Back,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptEntry {
    Command(Command),
    Answers(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub entries: Vec<ScriptEntry>,
}

/// What one entry did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Moved,
    AtEnd,
    AtStart,
    Restarted,
    /// The estimate step needed an answer that is still missing.
    RoutedBack(String),
}

impl From<Navigation> for Outcome {
    fn from(navigation: Navigation) -> Self {
        match navigation {
            Navigation::Moved(_) => Self::Moved,
            Navigation::AtEnd(_) => Self::AtEnd,
            Navigation::AtStart(_) => Self::AtStart,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    pub index: usize,
    pub action: &'static str,
    pub outcome: Outcome,
    /// Step shown after the entry was applied.
    pub step: StepId,
}

impl Script {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ScriptError> {
        serde_json::from_str(text).map_err(|source| ScriptError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Final answers of the script, ignoring navigation. `"restart"`
    /// discards everything before it.
    pub fn merged_state(&self) -> Result<FormState, ScriptError> {
        let mut state = FormState::new();
        for (index, entry) in self.entries.iter().enumerate() {
            match entry {
                ScriptEntry::Command(Command::Back) => {}
                ScriptEntry::Command(Command::Restart) => state = FormState::new(),
                ScriptEntry::Answers(value) => {
                    let patch = FormPatch::from_json(value)
                        .map_err(|source| ScriptError::Patch { index, source })?;
                    state = state.apply(&patch);
                }
            }
        }
        Ok(state)
    }

    /// Plays every entry against `session`.
    ///
    /// A missing estimate input is recorded in the trace and the replay
    /// continues from the step the session was routed to. Any other error
    /// stops the replay.
    pub fn replay(&self, session: &mut WizardSession) -> Result<Vec<TraceLine>, ScriptError> {
        let mut trace = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let wizard = |source: WizardError| ScriptError::Wizard { index, source };
            let (action, outcome) = match entry {
                ScriptEntry::Command(Command::Back) => {
                    ("back", Outcome::from(session.back().map_err(wizard)?))
                }
                ScriptEntry::Command(Command::Restart) => {
                    session.restart();
                    ("restart", Outcome::Restarted)
                }
                ScriptEntry::Answers(value) => {
                    let patch = FormPatch::from_json(value)
                        .map_err(|source| ScriptError::Patch { index, source })?;
                    match session.submit(&patch) {
                        Ok(navigation) => ("next", Outcome::from(navigation)),
                        Err(err @ WizardError::CannotEstimate { .. }) => {
                            ("next", Outcome::RoutedBack(err.to_string()))
                        }
                        Err(err) => return Err(wizard(err)),
                    }
                }
            };
            let step = session.current_step().map_err(|e| wizard(e.into()))?.id;
            debug!(index, action, %step, "script entry applied");
            trace.push(TraceLine {
                index,
                action,
                outcome,
                step,
            });
        }
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn script(value: Value) -> Script {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn strings_become_commands() {
        let script = script(json!(["back", "restart", { "general": {} }]));

        assert_eq!(
            script.entries,
            vec![
                ScriptEntry::Command(Command::Back),
                ScriptEntry::Command(Command::Restart),
                ScriptEntry::Answers(json!({ "general": {} })),
            ]
        );
    }

    #[test]
    fn merged_state_ignores_navigation_and_honours_restart() {
        let script = script(json!([
            { "general": { "dwellingType": "office" } },
            "restart",
            { "general": { "dwellingType": "apartment" } },
            "back",
            { "general": { "surfaceArea": 70 } }
        ]));

        let state = script.merged_state().unwrap();

        assert_eq!(
            state.general.dwelling_type,
            Some(lead_core::DwellingType::Apartment)
        );
        assert!(state.general.surface_area.is_some());
    }

    #[test]
    fn bad_entry_reports_its_index() {
        let script = script(json!([{ "general": {} }, { "garage": {} }]));

        let err = script.merged_state().unwrap_err();

        assert!(matches!(err, ScriptError::Patch { index: 1, .. }));
    }

    #[test]
    fn unknown_command_is_rejected_as_answers() {
        let script = script(json!(["forward"]));
        let mut session = WizardSession::default();

        let err = script.replay(&mut session).unwrap_err();

        assert!(matches!(
            err,
            ScriptError::Patch {
                index: 0,
                source: PatchError::NotAMapping(_)
            }
        ));
    }

    #[test]
    fn replay_traces_each_entry() {
        let script = script(json!([
            "back",
            { "general": { "dwellingType": "apartment" } },
            { "general": { "surfaceArea": 85 } },
            "back"
        ]));
        let mut session = WizardSession::default();

        let trace = script.replay(&mut session).unwrap();

        let summary: Vec<_> = trace
            .iter()
            .map(|t| (t.action, t.outcome.clone(), t.step))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("back", Outcome::AtStart, StepId::DwellingType),
                ("next", Outcome::Moved, StepId::SurfaceArea),
                ("next", Outcome::Moved, StepId::ConstructionStatus),
                ("back", Outcome::Moved, StepId::SurfaceArea),
            ]
        );
    }

    #[test]
    fn replay_records_routing_and_continues() {
        let script = script(json!([
            { "general": { "dwellingType": "office" } },
            {}, {}, {}, {},
            { "contact": { "email": "x@example.com", "privacyConsent": true } },
            { "general": { "surfaceArea": 50 } }
        ]));
        let mut session = WizardSession::default();

        let trace = script.replay(&mut session).unwrap();

        assert!(matches!(trace[5].outcome, Outcome::RoutedBack(_)));
        assert_eq!(trace[5].step, StepId::SurfaceArea);
        assert_eq!(trace[6].step, StepId::ConstructionStatus);
    }
}
