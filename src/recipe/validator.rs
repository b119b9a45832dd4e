//! Recipe Validation
//!
//! Definition checks run on a freshly parsed recipe, before any step is
//! declared:
//! - Recipe and step ID checks
//! - Parameter names unique across inputs and outputs
//! - Every supplied value has a schema

use std::collections::HashSet;

use log::{debug, info, warn};

use super::model::{Recipe, Step};

/// Definition error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    EmptyRecipe,
    EmptyStepId,
    DuplicateStepId(String),
    ParameterClash { step: String, name: String },
    UndeclaredValue { step: String, name: String },
}

impl std::fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRecipe => write!(f, "Recipe has no steps"),
            Self::EmptyStepId => write!(f, "Step has empty or whitespace-only ID"),
            Self::DuplicateStepId(id) => write!(f, "Duplicate step ID: '{}'", id),
            Self::ParameterClash { step, name } => {
                write!(f, "Step '{}': '{}' is declared as both input and output", step, name)
            }
            Self::UndeclaredValue { step, name } => {
                write!(f, "Step '{}': value given for unknown parameter '{}'", step, name)
            }
        }
    }
}

/// Validates a single step's definition.
fn validate_step(step: &Step) -> Vec<DefinitionError> {
    let mut errors = Vec::new();

    if step.id.trim().is_empty() {
        errors.push(DefinitionError::EmptyStepId);
        return errors;
    }

    for name in step.inputs.keys().filter(|name| step.outputs.contains_key(*name)) {
        errors.push(DefinitionError::ParameterClash {
            step: step.id.clone(),
            name: name.clone(),
        });
    }

    for name in step.params.keys() {
        if step.schema(name).is_none() {
            errors.push(DefinitionError::UndeclaredValue {
                step: step.id.clone(),
                name: name.clone(),
            });
        }
    }

    for (name, schema) in step.inputs.iter().chain(step.outputs.iter()) {
        if schema.required && !step.params.contains_key(name) && schema.default.is_none() {
            warn!(
                "Step '{}': required parameter '{}' has no value or default",
                step.id, name
            );
        }
    }

    if step.inputs.is_empty() && step.outputs.is_empty() {
        debug!("Step '{}' declares no parameters", step.id);
    }

    errors
}

/// Validates the entire recipe definition.
///
/// Performs the following checks:
/// 1. Recipe is not empty
/// 2. No duplicate step IDs
/// 3. Every step has a valid definition
pub fn validate_recipe(recipe: &Recipe) -> Result<(), String> {
    info!("Validating recipe with {} steps", recipe.steps.len());

    if recipe.steps.is_empty() {
        return Err(DefinitionError::EmptyRecipe.to_string());
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for step in &recipe.steps {
        if !step.id.trim().is_empty() && !seen_ids.insert(step.id.as_str()) {
            return Err(DefinitionError::DuplicateStepId(step.id.clone()).to_string());
        }
    }

    let all_errors: Vec<DefinitionError> = recipe.steps.iter().flat_map(validate_step).collect();

    if !all_errors.is_empty() {
        let error_messages: Vec<String> = all_errors.iter().map(|e| e.to_string()).collect();
        return Err(error_messages.join("\n"));
    }

    let parameters: usize = recipe
        .steps
        .iter()
        .map(|s| s.inputs.len() + s.outputs.len())
        .sum();
    info!(
        "Recipe validated: {} steps, {} parameters",
        recipe.steps.len(),
        parameters
    );
    Ok(())
}
