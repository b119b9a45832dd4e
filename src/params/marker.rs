//! Glob Marker
//!
//! Distinguishes patterns to expand from literal paths.
//!
//! Declarations cross the schema boundary as plain strings or string lists
//! ([`RawValue`]). A single string is classified on ingestion:
//!
//! - `glob:build/*.o` is an explicit glob (prefix stripped before matching)
//! - `build/*.o` is an implicit glob when metacharacter detection is on
//! - `build/main.o` is a literal
//! - `[a.txt, b.txt]` is a literal list, the form a substituted list takes
//!
//! Lists are always literal. Encoding a [`ParameterValue`] reproduces the
//! declaration it was decoded from.

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::config::GlobConfig;
use crate::error::ExpansionError;

/// Characters that make an unprefixed string an implicit glob.
const GLOB_METACHARS: &[char] = &['*', '?', '['];

/// Parameter value as supplied by the declaration layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawValue {
    Single(String),
    List(Vec<String>),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Single(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Single(value)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(values: Vec<String>) -> Self {
        RawValue::List(values)
    }
}

impl From<Vec<&str>> for RawValue {
    fn from(values: Vec<&str>) -> Self {
        RawValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// A pattern awaiting filesystem expansion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobPattern {
    /// Pattern text with any prefix token removed
    pub pattern: String,
    /// Whether the declaration carried the prefix token
    pub explicit: bool,
}

/// Decoded parameter value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    /// Concrete paths, in declaration order
    Literal(Vec<String>),
    /// Pattern to expand against the filesystem
    Glob(GlobPattern),
}

impl ParameterValue {
    /// Creates a single-path literal.
    pub fn literal(path: impl Into<String>) -> Self {
        ParameterValue::Literal(vec![path.into()])
    }

    /// Creates an explicit glob.
    pub fn glob(pattern: impl Into<String>) -> Self {
        ParameterValue::Glob(GlobPattern {
            pattern: pattern.into(),
            explicit: true,
        })
    }

    pub fn is_glob(&self) -> bool {
        matches!(self, ParameterValue::Glob(_))
    }

    /// Returns the pattern text, or `MarkerMismatch` for a literal.
    pub fn pattern_text(&self) -> Result<&str, ExpansionError> {
        match self {
            ParameterValue::Glob(glob) => Ok(&glob.pattern),
            ParameterValue::Literal(_) => Err(ExpansionError::MarkerMismatch {
                expected: "glob",
                found: "literal",
            }),
        }
    }

    /// Returns the literal paths, or `MarkerMismatch` for a glob.
    pub fn literal_paths(&self) -> Result<&[String], ExpansionError> {
        match self {
            ParameterValue::Literal(paths) => Ok(paths),
            ParameterValue::Glob(_) => Err(ExpansionError::MarkerMismatch {
                expected: "literal",
                found: "glob",
            }),
        }
    }
}

/// Classifies raw strings according to a [`GlobConfig`].
#[derive(Debug, Clone)]
pub struct GlobMarker {
    config: GlobConfig,
}

impl GlobMarker {
    pub fn new(config: GlobConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GlobConfig {
        &self.config
    }

    /// Returns the remainder after the prefix token, if present.
    fn strip_prefix<'a>(&self, value: &'a str) -> Option<&'a str> {
        self.config
            .glob_prefix_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .and_then(|token| value.strip_prefix(token))
    }

    /// Parses a string holding a bracketed list, e.g. `[a.txt, b.txt]`.
    fn formatted_list(&self, value: &str) -> Option<Vec<String>> {
        let trimmed = value.trim();
        if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
            return None;
        }
        serde_yaml::from_str::<Vec<String>>(trimmed).ok()
    }

    fn is_implicit_glob(&self, value: &str) -> bool {
        // Strings that look glob-like but don't compile stay literal
        self.config.implicit_globs
            && value.contains(GLOB_METACHARS)
            && Pattern::new(value).is_ok()
            && self.formatted_list(value).is_none()
    }

    pub fn is_glob(&self, value: &str) -> bool {
        self.strip_prefix(value).is_some() || self.is_implicit_glob(value)
    }

    /// Returns the pattern to match, with the prefix token removed.
    pub fn pattern_text<'a>(&self, value: &'a str) -> Result<&'a str, ExpansionError> {
        if let Some(pattern) = self.strip_prefix(value) {
            return Ok(pattern);
        }
        if self.is_implicit_glob(value) {
            return Ok(value);
        }
        Err(ExpansionError::MarkerMismatch {
            expected: "glob",
            found: "literal",
        })
    }

    /// Returns the literal path text, or `MarkerMismatch` for a glob.
    pub fn literal_text<'a>(&self, value: &'a str) -> Result<&'a str, ExpansionError> {
        if self.is_glob(value) {
            return Err(ExpansionError::MarkerMismatch {
                expected: "literal",
                found: "glob",
            });
        }
        Ok(value)
    }

    /// Decodes a raw declaration into its tagged form.
    pub fn decode(&self, raw: &RawValue) -> ParameterValue {
        match raw {
            RawValue::List(values) => ParameterValue::Literal(values.clone()),
            RawValue::Single(value) => {
                if let Some(pattern) = self.strip_prefix(value) {
                    ParameterValue::Glob(GlobPattern {
                        pattern: pattern.to_string(),
                        explicit: true,
                    })
                } else if let Some(values) = self.formatted_list(value) {
                    ParameterValue::Literal(values)
                } else if self.is_implicit_glob(value) {
                    ParameterValue::Glob(GlobPattern {
                        pattern: value.clone(),
                        explicit: false,
                    })
                } else {
                    ParameterValue::Literal(vec![value.clone()])
                }
            }
        }
    }

    /// Encodes a value back into its declaration form.
    ///
    /// A single literal that would re-decode as a glob is emitted as a
    /// one-element list, which always decodes as a literal.
    pub fn encode(&self, value: &ParameterValue) -> RawValue {
        match value {
            ParameterValue::Glob(glob) => match (&self.config.glob_prefix_token, glob.explicit) {
                (Some(token), true) if !token.is_empty() => {
                    RawValue::Single(format!("{}{}", token, glob.pattern))
                }
                _ => RawValue::Single(glob.pattern.clone()),
            },
            ParameterValue::Literal(paths) => match paths.as_slice() {
                [single] if !self.is_glob(single) && self.formatted_list(single).is_none() => {
                    RawValue::Single(single.clone())
                }
                _ => RawValue::List(paths.clone()),
            },
        }
    }
}

impl Default for GlobMarker {
    fn default() -> Self {
        Self::new(GlobConfig::default())
    }
}
