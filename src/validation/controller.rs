//! Validation Phase Controller
//!
//! Runs the three validation phases of a step. Every phase starts from the
//! step's snapshot, never from a previously expanded working set:
//!
//! - [`PhaseController::prevalidate`] expands every glob, input and output,
//!   against the filesystem as it is now. Output globs of steps that will be
//!   skipped are resolved here against files that already exist.
//! - [`PhaseController::validate_inputs`] reuses the prevalidation expansion
//!   for input globs and checks that inputs exist and are readable.
//! - [`PhaseController::validate_outputs`] re-expands every output glob,
//!   since running the step may have changed what matches.
//!
//! Parameter failures are collected per parameter; only lifecycle
//! violations and undeclared steps abort a phase.

use std::path::PathBuf;

use log::{debug, info, warn};

use super::checks::{check_paths, ensure_parent_directories, CheckPolicy};
use super::lifecycle::{ExecutionOutcome, Transition};
use super::result::{ParameterOutcome, Phase, ValidationResult};
use crate::config::GlobConfig;
use crate::error::{DeclarationError, ErrorKind, ParameterError, PhaseError};
use crate::params::expander::{ExpansionResult, GlobExpander, MatchPolicy};
use crate::params::marker::{GlobMarker, ParameterValue};
use crate::params::schema::{Direction, ParameterSchema};
use crate::params::snapshot::{restore, ParameterSet};
use crate::recipe::model::{decode_for, Step};

/// How a phase obtains paths for glob parameters.
#[derive(Clone, Copy)]
enum GlobSource<'a> {
    /// Query the filesystem now
    Expand,
    /// Use the expansion recorded by prevalidation
    Cached(Option<&'a ExpansionResult>),
}

/// Outcome of evaluating one parameter.
struct Evaluation {
    outcome: ParameterOutcome,
    /// Paths produced for a glob, to substitute into the working set
    expanded: Option<Vec<String>>,
}

/// Drives steps through prevalidation, input and output validation.
///
/// # Example
///
/// ```rust,no_run
/// use recipeguard::config::GlobConfig;
/// use recipeguard::params::ParameterSchema;
/// use recipeguard::recipe::Step;
/// use recipeguard::validation::{ExecutionOutcome, PhaseController};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let controller = PhaseController::new("/data/build", GlobConfig::default());
///     let mut step = Step::new("compile")
///         .with_input("sources", ParameterSchema::file_list(), "src/*.c")
///         .with_output("objects", ParameterSchema::file_list(), "glob:build/*.o");
///     controller.declare(&mut step)?;
///
///     controller.prevalidate(&mut step)?;
///     controller.validate_inputs(&mut step)?;
///     // ... the executor runs the step ...
///     controller.record_execution(&mut step, ExecutionOutcome::Ran)?;
///     let outputs = controller.validate_outputs(&mut step)?;
///     println!("{:?}", outputs.resolved_outputs());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PhaseController {
    marker: GlobMarker,
    expander: GlobExpander,
}

impl PhaseController {
    /// Creates a controller resolving paths under `root`.
    pub fn new(root: impl Into<PathBuf>, config: GlobConfig) -> Self {
        Self {
            marker: GlobMarker::new(config),
            expander: GlobExpander::new(root),
        }
    }

    pub fn marker(&self) -> &GlobMarker {
        &self.marker
    }

    pub fn expander(&self) -> &GlobExpander {
        &self.expander
    }

    pub fn config(&self) -> &GlobConfig {
        self.marker.config()
    }

    /// Declares a step using this controller's glob policy.
    pub fn declare(&self, step: &mut Step) -> Result<(), DeclarationError> {
        step.declare(&self.marker)
    }

    /// Expands every glob against the current filesystem and checks inputs
    /// and outputs structurally.
    ///
    /// Existence is only enforced for parameters with `must_exist: true`;
    /// an output glob matching nothing yet resolves to an empty list.
    pub fn prevalidate(&self, step: &mut Step) -> Result<ValidationResult, PhaseError> {
        let declared = restore(step)?;
        let next = step.state().advance(&step.id, Transition::Prevalidate)?;

        info!("Prevalidating step '{}'", step.id);

        let mut result = ValidationResult::new(&step.id, Phase::Prevalidate);
        let mut working = declared.clone();
        let mut expansion = ExpansionResult::new();

        for direction in [Direction::Input, Direction::Output] {
            for (name, schema) in step.schemas(direction) {
                let policy = CheckPolicy {
                    must_exist: schema.existence_enforced(false),
                    readable: false,
                };
                let evaluation = self.evaluate(
                    name,
                    direction,
                    schema,
                    &declared,
                    GlobSource::Expand,
                    policy,
                );

                if let Some(paths) = evaluation.expanded {
                    expansion.insert(name.clone(), paths.clone());
                    working.insert(name.clone(), ParameterValue::Literal(paths));
                }
                result.push(evaluation.outcome);
            }
        }

        step.set_working(working);
        step.set_cached_expansion(Some(expansion));
        step.set_state(next);

        self.log_result(&result);
        Ok(result)
    }

    /// Checks that inputs exist and are readable.
    ///
    /// Input globs are not re-expanded unless `reexpand_inputs` is set;
    /// the expansion recorded by prevalidation is used instead. Parent
    /// directories of literal output paths, and of any parameter marked
    /// `mkdir`, are created.
    pub fn validate_inputs(&self, step: &mut Step) -> Result<ValidationResult, PhaseError> {
        let declared = restore(step)?;
        let next = step.state().advance(&step.id, Transition::ValidateInputs)?;

        info!("Validating inputs of step '{}'", step.id);

        let source = if self.config().reexpand_inputs {
            GlobSource::Expand
        } else {
            GlobSource::Cached(step.cached_expansion())
        };

        let mut result = ValidationResult::new(&step.id, Phase::ValidateInputs);
        let mut working = declared.clone();

        for (name, schema) in &step.inputs {
            let policy = CheckPolicy {
                must_exist: schema.existence_enforced(true),
                readable: true,
            };
            let evaluation = self.evaluate(name, Direction::Input, schema, &declared, source, policy);

            if let Some(paths) = evaluation.expanded {
                working.insert(name.clone(), ParameterValue::Literal(paths));
            }
            result.push(evaluation.outcome);
        }

        for direction in [Direction::Input, Direction::Output] {
            for (name, schema) in step.schemas(direction) {
                let creates_parent =
                    schema.mkdir || (direction == Direction::Output && schema.dtype.is_path());
                if !creates_parent {
                    continue;
                }
                let Some(ParameterValue::Literal(paths)) = self.phase_value(&declared, name, schema) else {
                    continue;
                };
                if let Err(err) = ensure_parent_directories(&paths, self.expander.root()) {
                    result.push(ParameterOutcome::fail(name, direction, paths, false, err));
                }
            }
        }

        step.set_working(working);
        step.set_state(next);

        self.log_result(&result);
        Ok(result)
    }

    /// Records whether the executor ran or skipped the step.
    pub fn record_execution(
        &self,
        step: &mut Step,
        outcome: ExecutionOutcome,
    ) -> Result<(), PhaseError> {
        if !step.is_declared() {
            return Err(PhaseError::SnapshotMissing {
                step: step.id.clone(),
            });
        }
        let next = step.state().advance(&step.id, Transition::Record(outcome))?;
        debug!("Step '{}' execution recorded: {:?}", step.id, outcome);
        step.set_state(next);
        Ok(())
    }

    /// Re-expands every output glob and checks that outputs exist.
    ///
    /// The returned result carries the authoritative output lists for
    /// downstream consumers, see [`ValidationResult::resolved_outputs`].
    pub fn validate_outputs(&self, step: &mut Step) -> Result<ValidationResult, PhaseError> {
        let declared = restore(step)?;
        let next = step.state().advance(&step.id, Transition::ValidateOutputs)?;

        info!("Validating outputs of step '{}' ({})", step.id, step.state());

        let mut result = ValidationResult::new(&step.id, Phase::ValidateOutputs);
        let mut working = declared.clone();

        for (name, schema) in &step.outputs {
            let policy = CheckPolicy {
                must_exist: schema.existence_enforced(true),
                readable: false,
            };
            let evaluation = self.evaluate(
                name,
                Direction::Output,
                schema,
                &declared,
                GlobSource::Expand,
                policy,
            );

            if let Some(paths) = evaluation.expanded {
                working.insert(name.clone(), ParameterValue::Literal(paths));
            }
            result.push(evaluation.outcome);
        }

        step.set_working(working);
        step.set_cached_expansion(None);
        step.set_state(next);

        self.log_result(&result);
        Ok(result)
    }

    /// Declared value for a parameter, falling back to its schema default.
    fn phase_value(
        &self,
        declared: &ParameterSet,
        name: &str,
        schema: &ParameterSchema,
    ) -> Option<ParameterValue> {
        declared.get(name).cloned().or_else(|| {
            schema
                .default
                .as_ref()
                .map(|raw| decode_for(&self.marker, schema, raw))
        })
    }

    fn evaluate(
        &self,
        name: &str,
        direction: Direction,
        schema: &ParameterSchema,
        declared: &ParameterSet,
        source: GlobSource<'_>,
        policy: CheckPolicy,
    ) -> Evaluation {
        let Some(value) = self.phase_value(declared, name, schema) else {
            let outcome = if schema.required {
                ParameterOutcome::fail(
                    name,
                    direction,
                    Vec::new(),
                    false,
                    ParameterError::new(ErrorKind::Required, "required parameter has no value"),
                )
            } else {
                ParameterOutcome::pass(name, direction, Vec::new(), false)
            };
            return Evaluation {
                outcome,
                expanded: None,
            };
        };

        let require_match = schema.require_at_least_one_match && policy.must_exist;

        let (paths, from_glob) = match value {
            ParameterValue::Literal(paths) => (paths, false),
            ParameterValue::Glob(glob) => {
                let resolved = match source {
                    GlobSource::Expand => self
                        .expander
                        .expand(&glob.pattern, MatchPolicy::from_requirement(require_match))
                        .map_err(ParameterError::from),
                    GlobSource::Cached(cache) => cached_paths(cache, name, &glob.pattern, require_match),
                };
                match resolved {
                    Ok(paths) => {
                        debug!("{}.{}: '{}' -> {:?}", direction, name, glob.pattern, paths);
                        (paths, true)
                    }
                    Err(err) => {
                        return Evaluation {
                            outcome: ParameterOutcome::fail(name, direction, Vec::new(), true, err),
                            expanded: None,
                        };
                    }
                }
            }
        };

        let outcome = match check_paths(schema, &paths, self.expander.root(), policy) {
            Ok(()) => ParameterOutcome::pass(name, direction, paths.clone(), from_glob),
            Err(err) => ParameterOutcome::fail(name, direction, paths.clone(), from_glob, err),
        };

        Evaluation {
            outcome,
            expanded: from_glob.then_some(paths),
        }
    }

    fn log_result(&self, result: &ValidationResult) {
        if result.passed() {
            info!(
                "Step '{}' passed {} ({} parameters)",
                result.step,
                result.phase,
                result.parameters.len()
            );
        } else {
            warn!("Step '{}' failed {}:", result.step, result.phase);
            for line in result.failure_summary().lines() {
                warn!("  {}", line);
            }
        }
    }
}

/// Looks up a glob's paths from the prevalidation expansion.
fn cached_paths(
    cache: Option<&ExpansionResult>,
    name: &str,
    pattern: &str,
    require_match: bool,
) -> Result<Vec<String>, ParameterError> {
    let paths = cache.and_then(|c| c.get(name)).ok_or_else(|| {
        ParameterError::new(
            ErrorKind::Unresolved,
            format!("glob '{}' was not resolved during prevalidation", pattern),
        )
    })?;

    if paths.is_empty() && require_match {
        return Err(ParameterError::new(
            ErrorKind::NoMatches,
            format!("glob pattern '{}' matched no files", pattern),
        ));
    }

    Ok(paths.clone())
}
