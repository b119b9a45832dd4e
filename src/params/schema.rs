//! Parameter Schemas
//!
//! Declaration metadata for a step's inputs and outputs.
//!
//! # Example YAML Format
//!
//! ```yaml
//! inputs:
//!   sources:
//!     dtype: file_list
//!     must_exist: true
//!   config:
//!     dtype: file
//!     required: true
//! outputs:
//!   objects:
//!     dtype: file_list
//!     require_at_least_one_match: false
//! ```

use serde::{Deserialize, Serialize};

use super::marker::RawValue;

/// Data type of a parameter value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    /// Plain string, never expanded or checked against the filesystem
    #[default]
    Str,
    /// Exactly one regular file
    File,
    /// Exactly one directory
    Directory,
    /// Any number of regular files
    FileList,
    /// Any number of directories
    DirectoryList,
}

impl DType {
    /// True for dtypes whose values are filesystem paths.
    pub fn is_path(&self) -> bool {
        !matches!(self, DType::Str)
    }

    /// True for dtypes that hold exactly one path.
    pub fn is_single(&self) -> bool {
        matches!(self, DType::File | DType::Directory)
    }

    /// True for dtypes whose paths must be directories.
    pub fn is_directory(&self) -> bool {
        matches!(self, DType::Directory | DType::DirectoryList)
    }
}

/// Which side of a step a parameter belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Schema of a single parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParameterSchema {
    /// Free-form description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub info: String,

    #[serde(default)]
    pub dtype: DType,

    /// Parameter must have a value (or a default)
    #[serde(default)]
    pub required: bool,

    /// Value used when none is declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<RawValue>,

    /// Whether paths must exist. `None` applies the phase default:
    /// enforced by the input and output checks, not by prevalidation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_exist: Option<bool>,

    /// A glob matching nothing fails instead of yielding an empty list
    #[serde(default = "default_require_match")]
    pub require_at_least_one_match: bool,

    /// Allowed values; empty means unrestricted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    /// Create the parent directory of the value before the step runs
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mkdir: bool,
}

fn default_require_match() -> bool {
    true
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            info: String::new(),
            dtype: DType::Str,
            required: false,
            default: None,
            must_exist: None,
            require_at_least_one_match: true,
            choices: Vec::new(),
            mkdir: false,
        }
    }
}

impl ParameterSchema {
    /// Creates a schema of the given dtype.
    pub fn new(dtype: DType) -> Self {
        Self {
            dtype,
            ..Self::default()
        }
    }

    pub fn file() -> Self {
        Self::new(DType::File)
    }

    pub fn directory() -> Self {
        Self::new(DType::Directory)
    }

    pub fn file_list() -> Self {
        Self::new(DType::FileList)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<RawValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = Some(must_exist);
        self
    }

    /// Sets the zero-match policy for globs.
    pub fn allow_empty_matches(mut self) -> Self {
        self.require_at_least_one_match = false;
        self
    }

    /// Restricts the parameter to a fixed set of values.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn mkdir(mut self) -> Self {
        self.mkdir = true;
        self
    }

    /// Returns the first value not among `choices`, if any.
    pub fn invalid_choice<'a>(&self, values: &'a [String]) -> Option<&'a str> {
        if self.choices.is_empty() {
            return None;
        }
        values
            .iter()
            .find(|value| !self.choices.contains(value))
            .map(String::as_str)
    }

    /// Resolves the existence policy for a phase whose default is `phase_default`.
    pub fn existence_enforced(&self, phase_default: bool) -> bool {
        self.must_exist.unwrap_or(phase_default)
    }
}
