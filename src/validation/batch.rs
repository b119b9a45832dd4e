//! Concurrent Validation of Independent Steps
//!
//! Steps are split into disjoint chunks, one per worker thread. Each worker
//! owns its chunk exclusively, so working sets are never shared; only the
//! controller and the immutable snapshots are read from several threads.
//! Results are reported over a channel and returned in step order.

use std::sync::mpsc::channel;
use std::thread;

use log::{error, info};

use super::controller::PhaseController;
use super::result::{Phase, ValidationResult};
use crate::error::PhaseError;
use crate::recipe::model::Step;

/// Result of one phase for one step.
#[derive(Debug)]
pub struct StepReport {
    pub step: String,
    pub result: Result<ValidationResult, PhaseError>,
}

impl StepReport {
    /// True if the phase ran and every parameter passed.
    pub fn passed(&self) -> bool {
        matches!(&self.result, Ok(result) if result.passed())
    }
}

/// Default worker count: one per logical CPU.
pub fn default_workers() -> usize {
    num_cpus::get()
}

/// Runs `phase` for every step, using up to `max_workers` threads.
///
/// Output validation still requires each step to have its execution
/// recorded; steps that have not are reported with a lifecycle error.
pub fn validate_all(
    controller: &PhaseController,
    steps: &mut [Step],
    phase: Phase,
    max_workers: usize,
) -> Vec<StepReport> {
    if steps.is_empty() {
        return Vec::new();
    }

    let workers = max_workers.clamp(1, steps.len());
    let chunk_size = steps.len().div_ceil(workers);

    info!(
        "Running {} for {} steps on {} worker(s)",
        phase,
        steps.len(),
        workers
    );

    let (tx, rx) = channel();

    thread::scope(|scope| {
        for (chunk_index, chunk) in steps.chunks_mut(chunk_size).enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                for (offset, step) in chunk.iter_mut().enumerate() {
                    let result = run_phase(controller, step, phase);
                    let index = chunk_index * chunk_size + offset;

                    if let Err(e) = tx.send((index, step.id.clone(), result)) {
                        error!("Failed to send validation result: {}", e);
                    }
                }
            });
        }
    });
    drop(tx);

    let mut indexed: Vec<_> = rx.into_iter().collect();
    indexed.sort_by_key(|(index, _, _)| *index);

    indexed
        .into_iter()
        .map(|(_, step, result)| StepReport { step, result })
        .collect()
}

/// Prevalidates every step concurrently.
pub fn prevalidate_all(
    controller: &PhaseController,
    steps: &mut [Step],
    max_workers: usize,
) -> Vec<StepReport> {
    validate_all(controller, steps, Phase::Prevalidate, max_workers)
}

fn run_phase(
    controller: &PhaseController,
    step: &mut Step,
    phase: Phase,
) -> Result<ValidationResult, PhaseError> {
    match phase {
        Phase::Prevalidate => controller.prevalidate(step),
        Phase::ValidateInputs => controller.validate_inputs(step),
        Phase::ValidateOutputs => controller.validate_outputs(step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobConfig;
    use crate::params::schema::ParameterSchema;
    use crate::validation::lifecycle::ExecutionOutcome;
    use std::fs;
    use tempfile::tempdir;

    fn make_steps(controller: &PhaseController, count: usize) -> Vec<Step> {
        (0..count)
            .map(|i| {
                let mut step = Step::new(format!("step{}", i)).with_output(
                    "objects",
                    ParameterSchema::file_list(),
                    format!("glob:build/s{}_*.o", i),
                );
                controller.declare(&mut step).unwrap();
                step
            })
            .collect()
    }

    #[test]
    fn test_prevalidate_all_preserves_order() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        for i in 0..7 {
            fs::write(dir.path().join(format!("build/s{}_a.o", i)), "o").unwrap();
        }

        let controller = PhaseController::new(dir.path(), GlobConfig::default());
        let mut steps = make_steps(&controller, 7);

        let reports = prevalidate_all(&controller, &mut steps, 3);
        assert_eq!(reports.len(), 7);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.step, format!("step{}", i));
            assert!(report.passed());
            let result = report.result.as_ref().unwrap();
            assert_eq!(
                result.resolved_outputs()["objects"],
                vec![format!("build/s{}_a.o", i)]
            );
        }
    }

    #[test]
    fn test_empty_batch() {
        let dir = tempdir().unwrap();
        let controller = PhaseController::new(dir.path(), GlobConfig::default());
        let reports = prevalidate_all(&controller, &mut [], 4);
        assert!(reports.is_empty());
    }

    #[test]
    fn test_more_workers_than_steps() {
        let dir = tempdir().unwrap();
        let controller = PhaseController::new(dir.path(), GlobConfig::default());
        let mut steps = make_steps(&controller, 2);

        let reports = prevalidate_all(&controller, &mut steps, 16);
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(StepReport::passed));
    }

    #[test]
    fn test_output_phase_reports_lifecycle_errors() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/s0_a.o"), "o").unwrap();

        let controller = PhaseController::new(dir.path(), GlobConfig::default());
        let mut steps = make_steps(&controller, 2);
        prevalidate_all(&controller, &mut steps, 2);
        controller
            .record_execution(&mut steps[0], ExecutionOutcome::Skipped)
            .unwrap();

        let reports = validate_all(&controller, &mut steps, Phase::ValidateOutputs, 2);
        assert!(reports[0].passed());
        assert!(matches!(reports[1].result, Err(PhaseError::Lifecycle { .. })));
    }

    #[test]
    fn test_default_workers_positive() {
        assert!(default_workers() >= 1);
    }
}
