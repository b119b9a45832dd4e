//! Parameter Declarations
//!
//! Schemas, glob markers, immutable snapshots and the glob expander that
//! together describe and resolve a step's inputs and outputs.
//!
//! # Structure
//!
//! - [`schema`]: Declared type and validation options of a parameter
//! - [`marker`]: Glob vs. literal classification of raw values
//! - [`snapshot`]: Immutable copy of the declared values
//! - [`expander`]: Filesystem glob expansion

pub mod expander;
pub mod marker;
pub mod schema;
pub mod snapshot;

pub use expander::{ExpansionResult, GlobExpander, MatchPolicy};
pub use marker::{GlobMarker, GlobPattern, ParameterValue, RawValue};
pub use schema::{DType, Direction, ParameterSchema};
pub use snapshot::{restore, snapshot, ParameterSet, ParameterSnapshot};
