//! Recipe Data Model
//!
//! Steps and the recipes that group them.
//!
//! # Example YAML Format
//!
//! ```yaml
//! name: build
//! steps:
//!   - id: compile
//!     inputs:
//!       sources: { dtype: file_list, must_exist: true }
//!     outputs:
//!       objects: { dtype: file_list }
//!     params:
//!       sources: "src/*.c"
//!       objects: "glob:build/*.o"
//!
//!   - id: link
//!     inputs:
//!       objects: { dtype: file_list }
//!     outputs:
//!       binary: { dtype: file }
//!     params:
//!       objects: "glob:build/*.o"
//!       binary: build/app
//! ```

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::DeclarationError;
use crate::params::expander::ExpansionResult;
use crate::params::marker::{GlobMarker, ParameterValue, RawValue};
use crate::params::schema::{Direction, ParameterSchema};
use crate::params::snapshot::{snapshot, ParameterSet, ParameterSnapshot};
use crate::validation::lifecycle::StepState;

/// A single unit of work within a recipe.
///
/// Values in `params` are the declarations as supplied. Calling
/// [`Step::declare`] decodes them, snapshots the result, and moves the
/// step into the validation lifecycle.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Step {
    /// Unique identifier within the recipe
    pub id: String,

    /// Input parameter schemas
    #[serde(default)]
    pub inputs: BTreeMap<String, ParameterSchema>,

    /// Output parameter schemas
    #[serde(default)]
    pub outputs: BTreeMap<String, ParameterSchema>,

    /// Declared values, possibly glob-prefixed
    #[serde(default)]
    pub params: BTreeMap<String, RawValue>,

    #[serde(skip)]
    snapshot: Option<ParameterSnapshot>,

    #[serde(skip)]
    working: ParameterSet,

    #[serde(skip)]
    state: StepState,

    /// Expansion from the last prevalidation of this run
    #[serde(skip)]
    cached_expansion: Option<ExpansionResult>,
}

impl Step {
    /// Creates an empty, undeclared step.
    ///
    /// # Example
    ///
    /// ```
    /// use recipeguard::params::ParameterSchema;
    /// use recipeguard::recipe::Step;
    ///
    /// let step = Step::new("compile")
    ///     .with_input("sources", ParameterSchema::file_list(), "src/*.c")
    ///     .with_output("objects", ParameterSchema::file_list(), "glob:build/*.o");
    /// ```
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            params: BTreeMap::new(),
            snapshot: None,
            working: ParameterSet::new(),
            state: StepState::Declared,
            cached_expansion: None,
        }
    }

    /// Adds an input parameter with a declared value.
    pub fn with_input(
        mut self,
        name: impl Into<String>,
        schema: ParameterSchema,
        value: impl Into<RawValue>,
    ) -> Self {
        let name = name.into();
        self.params.insert(name.clone(), value.into());
        self.inputs.insert(name, schema);
        self
    }

    /// Adds an output parameter with a declared value.
    pub fn with_output(
        mut self,
        name: impl Into<String>,
        schema: ParameterSchema,
        value: impl Into<RawValue>,
    ) -> Self {
        let name = name.into();
        self.params.insert(name.clone(), value.into());
        self.outputs.insert(name, schema);
        self
    }

    /// Adds a parameter schema without a declared value.
    pub fn with_schema(
        mut self,
        name: impl Into<String>,
        direction: Direction,
        schema: ParameterSchema,
    ) -> Self {
        match direction {
            Direction::Input => self.inputs.insert(name.into(), schema),
            Direction::Output => self.outputs.insert(name.into(), schema),
        };
        self
    }

    /// Decodes and snapshots the declared parameters.
    ///
    /// Path-typed parameters go through the glob marker; all other values
    /// are kept literal. Later edits to `params` do not reach the snapshot.
    pub fn declare(&mut self, marker: &GlobMarker) -> Result<(), DeclarationError> {
        if self.snapshot.is_some() {
            return Err(DeclarationError::AlreadyDeclared {
                step: self.id.clone(),
            });
        }

        if let Some(name) = self.inputs.keys().find(|name| self.outputs.contains_key(*name)) {
            return Err(DeclarationError::DuplicateParameter {
                step: self.id.clone(),
                name: name.clone(),
            });
        }

        let mut decoded = ParameterSet::new();
        for (name, raw) in &self.params {
            let schema = self
                .schema(name)
                .ok_or_else(|| DeclarationError::UnknownParameter {
                    step: self.id.clone(),
                    name: name.clone(),
                })?;
            decoded.insert(name.clone(), decode_for(marker, schema, raw));
        }

        let globs = decoded.values().filter(|v| v.is_glob()).count();
        debug!(
            "Step '{}' declared: {} parameter(s), {} glob(s)",
            self.id,
            decoded.len(),
            globs
        );

        self.snapshot = Some(snapshot(&decoded));
        self.working = decoded;
        self.state = StepState::Declared;
        self.cached_expansion = None;
        Ok(())
    }

    /// Returns true once [`Step::declare`] has succeeded.
    pub fn is_declared(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<&ParameterSnapshot> {
        self.snapshot.as_ref()
    }

    /// Parameter set as resolved by the most recent phase.
    ///
    /// Globs handled by that phase appear as literal lists of their matches.
    pub fn working(&self) -> &ParameterSet {
        &self.working
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    /// Looks up a schema on either side.
    pub fn schema(&self, name: &str) -> Option<&ParameterSchema> {
        self.inputs.get(name).or_else(|| self.outputs.get(name))
    }

    /// Returns which side a parameter belongs to.
    pub fn direction(&self, name: &str) -> Option<Direction> {
        if self.inputs.contains_key(name) {
            Some(Direction::Input)
        } else if self.outputs.contains_key(name) {
            Some(Direction::Output)
        } else {
            None
        }
    }

    /// Schemas for one side of the step.
    pub fn schemas(&self, direction: Direction) -> &BTreeMap<String, ParameterSchema> {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub(crate) fn set_state(&mut self, state: StepState) {
        self.state = state;
    }

    pub(crate) fn set_working(&mut self, working: ParameterSet) {
        self.working = working;
    }

    pub(crate) fn cached_expansion(&self) -> Option<&ExpansionResult> {
        self.cached_expansion.as_ref()
    }

    pub(crate) fn set_cached_expansion(&mut self, expansion: Option<ExpansionResult>) {
        self.cached_expansion = expansion;
    }
}

/// Decodes a raw value the way its schema dictates.
pub(crate) fn decode_for(
    marker: &GlobMarker,
    schema: &ParameterSchema,
    raw: &RawValue,
) -> ParameterValue {
    if schema.dtype.is_path() {
        return marker.decode(raw);
    }
    match raw {
        RawValue::Single(value) => ParameterValue::Literal(vec![value.clone()]),
        RawValue::List(values) => ParameterValue::Literal(values.clone()),
    }
}

/// A named collection of steps.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Recipe {
    #[serde(default)]
    pub name: String,

    pub steps: Vec<Step>,
}

impl Recipe {
    /// Creates a new empty recipe.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Creates a recipe from a list of steps.
    pub fn from_steps(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Adds a step to the recipe.
    pub fn add_step(&mut self, step: Step) -> Result<(), String> {
        if self.steps.iter().any(|s| s.id == step.id) {
            return Err(format!("Step '{}' already exists", step.id));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Gets a step by ID.
    pub fn get_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Gets a mutable reference to a step by ID.
    pub fn get_step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Declares every step that has not been declared yet.
    pub fn declare_all(&mut self, marker: &GlobMarker) -> Result<(), DeclarationError> {
        for step in self.steps.iter_mut().filter(|s| !s.is_declared()) {
            step.declare(marker)?;
        }
        Ok(())
    }

    /// Returns the number of steps in the recipe.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the recipe has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobConfig;
    use crate::params::schema::DType;

    fn compile_step() -> Step {
        Step::new("compile")
            .with_input("sources", ParameterSchema::file_list(), "src/*.c")
            .with_input("flags", ParameterSchema::new(DType::Str), "-O2 -Wall *")
            .with_output("objects", ParameterSchema::file_list(), "glob:build/*.o")
    }

    #[test]
    fn test_step_creation() {
        let step = compile_step();
        assert_eq!(step.id, "compile");
        assert_eq!(step.inputs.len(), 2);
        assert_eq!(step.outputs.len(), 1);
        assert!(!step.is_declared());
        assert_eq!(step.state(), StepState::Declared);
    }

    #[test]
    fn test_declare_decodes_path_params_only() {
        let mut step = compile_step();
        step.declare(&GlobMarker::default()).unwrap();

        let snap = step.snapshot().unwrap();
        assert_eq!(snap.get("objects"), Some(&ParameterValue::glob("build/*.o")));
        assert!(snap.get("sources").unwrap().is_glob());
        assert_eq!(
            snap.get("flags"),
            Some(&ParameterValue::literal("-O2 -Wall *"))
        );
    }

    #[test]
    fn test_declare_twice_fails() {
        let mut step = compile_step();
        let marker = GlobMarker::default();
        step.declare(&marker).unwrap();
        assert!(matches!(
            step.declare(&marker),
            Err(DeclarationError::AlreadyDeclared { .. })
        ));
    }

    #[test]
    fn test_declare_unknown_parameter() {
        let mut step = compile_step();
        step.params.insert("bogus".to_string(), RawValue::from("x"));
        assert!(matches!(
            step.declare(&GlobMarker::default()),
            Err(DeclarationError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_declare_duplicate_parameter() {
        let mut step = Step::new("dup")
            .with_input("data", ParameterSchema::file(), "a.txt")
            .with_schema("data", Direction::Output, ParameterSchema::file());
        assert!(matches!(
            step.declare(&GlobMarker::default()),
            Err(DeclarationError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_snapshot_ignores_later_edits() {
        let mut step = compile_step();
        step.declare(&GlobMarker::default()).unwrap();
        step.params.insert("objects".to_string(), RawValue::from("build/x.o"));

        assert_eq!(
            step.snapshot().unwrap().get("objects"),
            Some(&ParameterValue::glob("build/*.o"))
        );
    }

    #[test]
    fn test_declare_with_explicit_only_marker() {
        let mut step = Step::new("s")
            .with_input("data", ParameterSchema::file(), "file[1].txt");
        step.declare(&GlobMarker::new(GlobConfig::explicit_only())).unwrap();
        assert_eq!(
            step.snapshot().unwrap().get("data"),
            Some(&ParameterValue::literal("file[1].txt"))
        );
    }

    #[test]
    fn test_direction_lookup() {
        let step = compile_step();
        assert_eq!(step.direction("sources"), Some(Direction::Input));
        assert_eq!(step.direction("objects"), Some(Direction::Output));
        assert_eq!(step.direction("nope"), None);
        assert_eq!(step.schemas(Direction::Output).len(), 1);
    }

    #[test]
    fn test_recipe_add_step() {
        let mut recipe = Recipe::new("build");
        assert!(recipe.add_step(Step::new("a")).is_ok());
        assert!(recipe.add_step(Step::new("a")).is_err());
        assert_eq!(recipe.len(), 1);
        assert!(recipe.get_step("a").is_some());
        assert!(recipe.get_step_mut("missing").is_none());
    }

    #[test]
    fn test_recipe_declare_all() {
        let mut recipe = Recipe::from_steps("build", vec![compile_step(), Step::new("empty")]);
        recipe.declare_all(&GlobMarker::default()).unwrap();
        assert!(recipe.steps.iter().all(Step::is_declared));

        // Already-declared steps are left alone
        assert!(recipe.declare_all(&GlobMarker::default()).is_ok());
    }

    #[test]
    fn test_step_deserialize() {
        let yaml = r#"
id: compile
inputs:
  sources: { dtype: file_list }
outputs:
  objects: { dtype: file_list }
params:
  sources: [a.c, b.c]
  objects: "glob:build/*.o"
"#;
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.params["sources"], RawValue::from(vec!["a.c", "b.c"]));
        assert!(!step.is_declared());
    }
}
