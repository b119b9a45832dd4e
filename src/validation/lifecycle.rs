//! Step Validation Lifecycle
//!
//! ```text
//! Declared ──prevalidate──▶ Prevalidated ──ran──────▶ Ran ─────┐
//!                             │  ▲    │                          ├─validate_outputs─▶ OutputsValidated
//!                             └──┘    └──skipped──▶ Skipped ───┘
//!                  prevalidate / validate_inputs
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PhaseError;

/// Where a step is in its validation lifecycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Parameters declared, nothing validated yet
    #[default]
    Declared,
    /// Prevalidation finished; inputs may be checked
    Prevalidated,
    /// The executor ran the step
    Ran,
    /// The executor decided not to run the step
    Skipped,
    /// Outputs validated; no further transitions
    OutputsValidated,
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepState::Declared => "declared",
            StepState::Prevalidated => "prevalidated",
            StepState::Ran => "ran",
            StepState::Skipped => "skipped",
            StepState::OutputsValidated => "outputs validated",
        };
        f.write_str(name)
    }
}

/// Execution signal supplied by the executor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Ran,
    Skipped,
}

/// Operations that move a step through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Prevalidate,
    ValidateInputs,
    Record(ExecutionOutcome),
    ValidateOutputs,
}

impl Transition {
    fn action(&self) -> &'static str {
        match self {
            Transition::Prevalidate => "prevalidate",
            Transition::ValidateInputs => "validate inputs",
            Transition::Record(ExecutionOutcome::Ran) => "record a run",
            Transition::Record(ExecutionOutcome::Skipped) => "record a skip",
            Transition::ValidateOutputs => "validate outputs",
        }
    }
}

impl StepState {
    /// Returns the state after `transition`, or a lifecycle error.
    pub fn advance(self, step: &str, transition: Transition) -> Result<StepState, PhaseError> {
        use StepState::*;

        let next = match (self, transition) {
            (Declared | Prevalidated, Transition::Prevalidate) => Some(Prevalidated),
            (Prevalidated, Transition::ValidateInputs) => Some(Prevalidated),
            (Prevalidated, Transition::Record(ExecutionOutcome::Ran)) => Some(Ran),
            (Prevalidated, Transition::Record(ExecutionOutcome::Skipped)) => Some(Skipped),
            (Ran | Skipped, Transition::ValidateOutputs) => Some(OutputsValidated),
            _ => None,
        };

        next.ok_or_else(|| PhaseError::Lifecycle {
            step: step.to_string(),
            action: transition.action(),
            state: self.to_string(),
        })
    }
}
