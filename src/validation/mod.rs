//! Step Validation Module
//!
//! Runs the three validation phases of a step and tracks where each step
//! is in its lifecycle.
//!
//! # Architecture
//!
//! - [`controller`]: Phase orchestration (prevalidate, inputs, outputs)
//! - [`checks`]: Structural path checks
//! - [`lifecycle`]: Step state machine
//! - [`result`]: Per-parameter outcomes
//! - [`batch`]: Concurrent validation across steps

pub mod batch;
pub mod checks;
pub mod controller;
pub mod lifecycle;
pub mod result;

pub use batch::{prevalidate_all, validate_all, StepReport};
pub use controller::PhaseController;
pub use lifecycle::{ExecutionOutcome, StepState};
pub use result::{ParameterOutcome, Phase, ValidationResult};
