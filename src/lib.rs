//! RecipeGuard - Glob-Aware Step Parameter Validation
//!
//! Validates the file parameters of recipe steps before and after they run.
//! Parameters may be concrete paths or glob patterns; patterns are expanded
//! against the filesystem in every phase from an immutable snapshot of the
//! declarations, so a step's outputs are judged by what actually exists
//! after it ran rather than by what existed beforehand.
//!
//! # Architecture
//!
//! The library is organized into five modules:
//!
//! - [`config`]: Glob prefix token and implicit-glob settings
//! - [`error`]: Error kinds and per-phase error types
//! - [`params`]: Schemas, glob markers, snapshots and the glob expander
//! - [`recipe`]: Steps, recipes and YAML loading
//! - [`validation`]: Phase controller, lifecycle and concurrent validation
//!
//! # Example
//!
//! ```rust,no_run
//! use recipeguard::config::GlobConfig;
//! use recipeguard::validation::{ExecutionOutcome, PhaseController};
//! use recipeguard::load_recipe;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut recipe = load_recipe("recipe.yaml")?;
//!     let controller = PhaseController::new("/data/build", GlobConfig::from_env());
//!     recipe.declare_all(controller.marker())?;
//!
//!     for step in &mut recipe.steps {
//!         controller.prevalidate(step)?;
//!         let inputs = controller.validate_inputs(step)?;
//!         if !inputs.passed() {
//!             return Err(inputs.failure_summary().into());
//!         }
//!
//!         // ... run the step ...
//!
//!         controller.record_execution(step, ExecutionOutcome::Ran)?;
//!         let outputs = controller.validate_outputs(step)?;
//!         println!("{}: {:?}", step.id, outputs.resolved_outputs());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod params;
pub mod recipe;
pub mod validation;

// Re-export commonly used types
pub use config::GlobConfig;
pub use error::{ErrorKind, ExpansionError, ParameterError, PhaseError};
pub use params::{GlobExpander, GlobMarker, ParameterSchema, ParameterValue};
pub use recipe::model::{Recipe, Step};
pub use recipe::parser::load_recipe;
pub use validation::{ExecutionOutcome, PhaseController, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "RecipeGuard";

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "RecipeGuard");
    }

    #[test]
    fn test_module_exports_step() {
        let step = Step::new("test").with_input("data", ParameterSchema::file(), "in.txt");
        assert_eq!(step.id, "test");
        assert!(!step.is_declared());
    }

    #[test]
    fn test_module_exports_recipe() {
        let recipe = Recipe::new("empty");
        assert!(recipe.is_empty());
    }

    #[test]
    fn test_full_lifecycle_through_exports() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.c"), "int main;").unwrap();

        let controller = PhaseController::new(dir.path(), GlobConfig::default());
        let mut step = Step::new("compile")
            .with_input("sources", ParameterSchema::file_list(), "src/*.c")
            .with_output("objects", ParameterSchema::file_list(), "glob:build/*.o");
        controller.declare(&mut step).unwrap();

        assert!(controller.prevalidate(&mut step).unwrap().passed());
        let inputs = controller.validate_inputs(&mut step).unwrap();
        assert_eq!(inputs.resolved()["sources"], vec!["src/main.c"]);

        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/main.o"), "obj").unwrap();
        controller
            .record_execution(&mut step, ExecutionOutcome::Ran)
            .unwrap();

        let outputs = controller.validate_outputs(&mut step).unwrap();
        assert!(outputs.passed());
        assert_eq!(outputs.resolved_outputs()["objects"], vec!["build/main.o"]);
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
