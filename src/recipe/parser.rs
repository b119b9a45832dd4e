//! Recipe Parser
//!
//! Handles loading recipe definitions from YAML files and writing them
//! back out. Loaded recipes are checked but not declared; callers declare
//! them with the glob configuration of their run.

use std::error::Error;
use std::fs;

use log::{debug, info};

use super::model::Recipe;
use super::validator::validate_recipe;
use crate::params::marker::GlobMarker;

/// Loads a recipe from a YAML file.
///
/// This function:
/// 1. Reads and parses the YAML file
/// 2. Validates the recipe definition
///
/// # Example
///
/// ```rust,no_run
/// use recipeguard::recipe::load_recipe;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let recipe = load_recipe("recipe.yaml")?;
///     println!("Loaded {} steps", recipe.steps.len());
///     Ok(())
/// }
/// ```
pub fn load_recipe(path: &str) -> Result<Recipe, Box<dyn Error>> {
    info!("Loading recipe from: {}", path);

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read recipe file '{}': {}. Check that the file exists and is readable.",
            path, e
        )
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    parse_recipe(&yaml_content)
}

/// Parses and validates a recipe from YAML text.
pub fn parse_recipe(yaml_content: &str) -> Result<Recipe, Box<dyn Error>> {
    let recipe: Recipe = serde_yaml::from_str(yaml_content)
        .map_err(|e| format!("Failed to parse recipe YAML: {}. Check the file format.", e))?;

    info!(
        "Parsed recipe '{}' with {} steps",
        recipe.name,
        recipe.steps.len()
    );

    validate_recipe(&recipe)?;

    Ok(recipe)
}

/// Saves a recipe to a YAML file.
///
/// Declared steps are written from their snapshots, so the file reflects
/// the declarations rather than any later edits or expansions.
pub fn save_recipe(recipe: &Recipe, marker: &GlobMarker, path: &str) -> Result<(), Box<dyn Error>> {
    let mut output = recipe.clone();
    for step in &mut output.steps {
        if let Some(snapshot) = step.snapshot() {
            step.params = snapshot.encode(marker);
        }
    }

    let yaml_content = serde_yaml::to_string(&output)?;
    fs::write(path, yaml_content)?;
    info!("Recipe saved to: {}", path);
    Ok(())
}
