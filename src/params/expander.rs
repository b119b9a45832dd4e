//! Glob Expansion
//!
//! Expands patterns against the current contents of a filesystem root.
//! Results are never cached: every call reflects the directory state at
//! the moment it runs.
//!
//! Matching follows shell conventions:
//! - `*` and `?` never cross a `/`
//! - `[abc]`, `[a-z]` and `[!x]` character classes
//! - `**` as a whole path component matches any number of directories
//! - names starting with `.` must be matched explicitly

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::debug;

use super::marker::ParameterValue;
use crate::error::ExpansionError;

/// Mapping from parameter name to resolved paths.
pub type ExpansionResult = BTreeMap<String, Vec<String>>;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// What an expansion with no matches means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Zero matches fails with `NoMatches`
    AtLeastOne,
    /// Zero matches yields an empty list
    AllowEmpty,
}

impl MatchPolicy {
    pub fn from_requirement(require_at_least_one_match: bool) -> Self {
        if require_at_least_one_match {
            MatchPolicy::AtLeastOne
        } else {
            MatchPolicy::AllowEmpty
        }
    }
}

/// Expands glob patterns relative to a root directory.
#[derive(Debug, Clone)]
pub struct GlobExpander {
    root: PathBuf,
}

impl GlobExpander {
    /// Creates an expander for `root`. `.` components are dropped so that
    /// matches can be reported relative to it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = lexical(&root);
        if root.as_os_str().is_empty() {
            return Self {
                root: PathBuf::from("."),
            };
        }
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a declared path against the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Returns the current matches for `pattern`, sorted lexicographically.
    ///
    /// Relative patterns are matched under the root and reported relative
    /// to it; absolute patterns are reported as absolute paths.
    pub fn expand(&self, pattern: &str, policy: MatchPolicy) -> Result<Vec<String>, ExpansionError> {
        Pattern::new(pattern).map_err(|e| ExpansionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.msg.to_string(),
        })?;

        let absolute = Path::new(pattern).is_absolute();
        let full_pattern = if absolute {
            pattern.to_string()
        } else {
            self.rooted(pattern)?
        };

        let entries = glob::glob_with(&full_pattern, MATCH_OPTIONS).map_err(|e| {
            ExpansionError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.msg.to_string(),
            }
        })?;

        let mut matches = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ExpansionError::Io {
                pattern: pattern.to_string(),
                path: e.path().to_path_buf(),
                source: io::Error::from(e),
            })?;
            matches.push(self.report(pattern, &path, absolute)?);
        }

        matches.sort();
        matches.dedup();

        debug!("Expanded '{}' -> {} match(es)", pattern, matches.len());

        if matches.is_empty() && policy == MatchPolicy::AtLeastOne {
            return Err(ExpansionError::NoMatches {
                pattern: pattern.to_string(),
            });
        }

        Ok(matches)
    }

    /// Expands a tagged value. Literals are rejected with `MarkerMismatch`.
    pub fn expand_value(
        &self,
        value: &ParameterValue,
        policy: MatchPolicy,
    ) -> Result<Vec<String>, ExpansionError> {
        let pattern = value.pattern_text()?;
        self.expand(pattern, policy)
    }

    /// Builds the root-anchored pattern, escaping metacharacters in the root.
    fn rooted(&self, pattern: &str) -> Result<String, ExpansionError> {
        if self.root == Path::new(".") {
            return Ok(pattern.to_string());
        }
        let root = self.root.to_str().ok_or_else(|| ExpansionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!("root '{}' is not valid UTF-8", self.root.display()),
        })?;

        let joined = Path::new(&Pattern::escape(root)).join(pattern);
        Ok(joined.to_string_lossy().into_owned())
    }

    fn report(&self, pattern: &str, path: &Path, absolute: bool) -> Result<String, ExpansionError> {
        if absolute {
            return Ok(path.to_string_lossy().into_owned());
        }
        let base = lexical(&self.root);
        let found = lexical(path);
        found
            .strip_prefix(&base)
            .map(|relative| relative.to_string_lossy().into_owned())
            .map_err(|_| ExpansionError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: format!(
                    "match '{}' lies outside root '{}'",
                    path.display(),
                    self.root.display()
                ),
            })
    }
}

/// Drops `.` components, which `glob` does not echo back in its matches.
fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_expand_sorted() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "out/c.txt");
        touch(dir.path(), "out/a.txt");
        touch(dir.path(), "out/b.txt");
        touch(dir.path(), "out/skip.log");

        let expander = GlobExpander::new(dir.path());
        let matches = expander.expand("out/*.txt", MatchPolicy::AtLeastOne).unwrap();
        assert_eq!(matches, vec!["out/a.txt", "out/b.txt", "out/c.txt"]);
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "top.o");
        touch(dir.path(), "sub/nested.o");

        let expander = GlobExpander::new(dir.path());
        let matches = expander.expand("*.o", MatchPolicy::AtLeastOne).unwrap();
        assert_eq!(matches, vec!["top.o"]);
    }

    #[test]
    fn test_recursive_wildcard() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/main.c");
        touch(dir.path(), "src/util/strings.c");
        touch(dir.path(), "src/util/deep/io.c");

        let expander = GlobExpander::new(dir.path());
        let matches = expander.expand("src/**/*.c", MatchPolicy::AtLeastOne).unwrap();
        assert_eq!(
            matches,
            vec!["src/main.c", "src/util/deep/io.c", "src/util/strings.c"]
        );
    }

    #[test]
    fn test_question_mark_and_class() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "file1.txt");
        touch(dir.path(), "file2.txt");
        touch(dir.path(), "file10.txt");

        let expander = GlobExpander::new(dir.path());
        assert_eq!(
            expander.expand("file?.txt", MatchPolicy::AtLeastOne).unwrap(),
            vec!["file1.txt", "file2.txt"]
        );
        assert_eq!(
            expander.expand("file[1].txt", MatchPolicy::AtLeastOne).unwrap(),
            vec!["file1.txt"]
        );
    }

    #[test]
    fn test_hidden_files_need_literal_dot() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".hidden.txt");
        touch(dir.path(), "shown.txt");

        let expander = GlobExpander::new(dir.path());
        assert_eq!(
            expander.expand("*.txt", MatchPolicy::AtLeastOne).unwrap(),
            vec!["shown.txt"]
        );
    }

    #[test]
    fn test_zero_match_policy() {
        let dir = tempdir().unwrap();
        let expander = GlobExpander::new(dir.path());

        let result = expander.expand("*.missing", MatchPolicy::AtLeastOne);
        assert!(matches!(result, Err(ExpansionError::NoMatches { .. })));

        let result = expander.expand("*.missing", MatchPolicy::AllowEmpty).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempdir().unwrap();
        let expander = GlobExpander::new(dir.path());

        let result = expander.expand("out/***.txt", MatchPolicy::AllowEmpty);
        assert!(matches!(result, Err(ExpansionError::InvalidPattern { .. })));

        let result = expander.expand("data/[.txt", MatchPolicy::AllowEmpty);
        assert!(matches!(result, Err(ExpansionError::InvalidPattern { .. })));
    }

    #[test]
    fn test_root_with_metacharacters() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("run[1]");
        touch(&root, "a.txt");

        let expander = GlobExpander::new(&root);
        assert_eq!(
            expander.expand("*.txt", MatchPolicy::AtLeastOne).unwrap(),
            vec!["a.txt"]
        );
    }

    #[test]
    fn test_dot_prefixed_relative_root() {
        let dir = tempfile::tempdir_in(".").unwrap();
        let name = dir.path().file_name().unwrap().to_str().unwrap();
        touch(dir.path(), "data/a.csv");

        let dotted = GlobExpander::new(format!("./{}", name));
        assert_eq!(dotted.root(), Path::new(name));
        assert_eq!(
            dotted.expand("data/*.csv", MatchPolicy::AtLeastOne).unwrap(),
            vec!["data/a.csv"]
        );

        let plain = GlobExpander::new(name);
        assert_eq!(
            plain.expand("data/*.csv", MatchPolicy::AtLeastOne).unwrap(),
            vec!["data/a.csv"]
        );
    }

    #[test]
    fn test_current_directory_root() {
        let expander = GlobExpander::new(".");
        assert_eq!(expander.root(), Path::new("."));
        assert_eq!(
            expander.expand("Cargo.tom?", MatchPolicy::AtLeastOne).unwrap(),
            vec!["Cargo.toml"]
        );
        assert_eq!(GlobExpander::new("./").root(), Path::new("."));
    }

    #[test]
    fn test_absolute_pattern() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "abs.txt");

        let expander = GlobExpander::new("/nonexistent-root");
        let pattern = format!(
            "{}/*.txt",
            Pattern::escape(dir.path().to_str().unwrap())
        );
        let matches = expander.expand(&pattern, MatchPolicy::AtLeastOne).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].ends_with("abs.txt"));
        assert!(Path::new(&matches[0]).is_absolute());
    }

    #[test]
    fn test_expand_value_rejects_literal() {
        let dir = tempdir().unwrap();
        let expander = GlobExpander::new(dir.path());

        let result = expander.expand_value(&ParameterValue::literal("a.txt"), MatchPolicy::AllowEmpty);
        assert!(matches!(result, Err(ExpansionError::MarkerMismatch { .. })));
    }

    #[test]
    fn test_expansion_reflects_current_state() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "out/a.txt");

        let expander = GlobExpander::new(dir.path());
        let value = ParameterValue::glob("out/*.txt");
        assert_eq!(
            expander.expand_value(&value, MatchPolicy::AtLeastOne).unwrap(),
            vec!["out/a.txt"]
        );

        touch(dir.path(), "out/b.txt");
        assert_eq!(
            expander.expand_value(&value, MatchPolicy::AtLeastOne).unwrap(),
            vec!["out/a.txt", "out/b.txt"]
        );
    }

    #[test]
    fn test_match_policy_from_requirement() {
        assert_eq!(MatchPolicy::from_requirement(true), MatchPolicy::AtLeastOne);
        assert_eq!(MatchPolicy::from_requirement(false), MatchPolicy::AllowEmpty);
    }
}
