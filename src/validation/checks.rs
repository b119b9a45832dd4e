//! Structural Path Checks
//!
//! Existence, readability and type checks over resolved parameter values.
//! These never expand globs; they only look at the paths they are given.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::error::{ErrorKind, ParameterError};
use crate::params::schema::ParameterSchema;

/// What a check run should enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPolicy {
    /// Every path must exist
    pub must_exist: bool,
    /// Existing paths must be openable
    pub readable: bool,
}

/// Checks resolved values against a schema.
///
/// Choices apply to every dtype; plain-string parameters skip the
/// filesystem checks.
pub fn check_paths(
    schema: &ParameterSchema,
    paths: &[String],
    root: &Path,
    policy: CheckPolicy,
) -> Result<(), ParameterError> {
    if let Some(value) = schema.invalid_choice(paths) {
        return Err(ParameterError::new(
            ErrorKind::InvalidChoice,
            format!("invalid value '{}' (choices: {})", value, schema.choices.join(", ")),
        ));
    }

    let dtype = schema.dtype;
    if !dtype.is_path() {
        return Ok(());
    }

    if dtype.is_single() && paths.len() > 1 {
        return Err(ParameterError::new(
            ErrorKind::TypeMismatch,
            format!("multiple paths given ({})", paths.join(", ")),
        ));
    }

    if policy.must_exist && dtype.is_single() && paths.is_empty() {
        return Err(ParameterError::new(
            ErrorKind::Missing,
            "does not specify any path",
        ));
    }

    let mut missing = Vec::new();
    for path in paths {
        let full = root.join(path);
        let metadata = match fs::metadata(&full) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                missing.push(path.as_str());
                continue;
            }
            Err(e) => {
                return Err(ParameterError::new(
                    ErrorKind::Io,
                    format!("cannot stat '{}': {}", path, e),
                ));
            }
        };

        if dtype.is_directory() && !metadata.is_dir() {
            return Err(ParameterError::new(
                ErrorKind::TypeMismatch,
                format!("'{}' is not a directory", path),
            ));
        }
        if !dtype.is_directory() && !metadata.is_file() {
            return Err(ParameterError::new(
                ErrorKind::TypeMismatch,
                format!("'{}' is not a regular file", path),
            ));
        }

        if policy.readable {
            check_readable(&full, metadata.is_dir()).map_err(|e| {
                ParameterError::new(ErrorKind::Io, format!("cannot read '{}': {}", path, e))
            })?;
        }
    }

    if policy.must_exist && !missing.is_empty() {
        let noun = if missing.len() == 1 { "doesn't" } else { "don't" };
        return Err(ParameterError::new(
            ErrorKind::Missing,
            format!("{} {} exist", missing.join(", "), noun),
        ));
    }

    Ok(())
}

fn check_readable(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::read_dir(path).map(|_| ())
    } else {
        fs::File::open(path).map(|_| ())
    }
}

/// Creates missing parent directories for the given paths.
pub fn ensure_parent_directories(paths: &[String], root: &Path) -> Result<(), ParameterError> {
    for output_file in paths {
        if output_file.is_empty() {
            continue;
        }

        let output_path = root.join(output_file);
        if let Some(parent) = output_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    ParameterError::new(
                        ErrorKind::Io,
                        format!("cannot create directory '{}': {}", parent.display(), e),
                    )
                })?;
                debug!("Created directory: {}", parent.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::schema::DType;
    use tempfile::tempdir;

    const STRICT: CheckPolicy = CheckPolicy {
        must_exist: true,
        readable: true,
    };
    const LOOSE: CheckPolicy = CheckPolicy {
        must_exist: false,
        readable: false,
    };

    fn paths(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_existing_file_passes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("in.txt"), "data").unwrap();

        let result = check_paths(&ParameterSchema::file(), &paths(&["in.txt"]), dir.path(), STRICT);
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = tempdir().unwrap();
        let err = check_paths(
            &ParameterSchema::file_list(),
            &paths(&["a.txt", "b.txt"]),
            dir.path(),
            STRICT,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Missing);
        assert!(err.message.contains("a.txt, b.txt"));
    }

    #[test]
    fn test_missing_allowed_when_not_enforced() {
        let dir = tempdir().unwrap();
        let result = check_paths(&ParameterSchema::file(), &paths(&["later.txt"]), dir.path(), LOOSE);
        assert!(result.is_ok());
    }

    #[test]
    fn test_multiple_paths_for_single_dtype() {
        let dir = tempdir().unwrap();
        let err = check_paths(&ParameterSchema::file(), &paths(&["a", "b"]), dir.path(), LOOSE)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_empty_single_path() {
        let dir = tempdir().unwrap();
        let err = check_paths(&ParameterSchema::file(), &[], dir.path(), STRICT).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Missing);

        assert!(check_paths(&ParameterSchema::file_list(), &[], dir.path(), STRICT).is_ok());
    }

    #[test]
    fn test_directory_type_mismatch() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plain.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let err = check_paths(&ParameterSchema::directory(), &paths(&["plain.txt"]), dir.path(), LOOSE)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);

        let err = check_paths(&ParameterSchema::file_list(), &paths(&["sub"]), dir.path(), LOOSE)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);

        let ok = check_paths(
            &ParameterSchema::new(DType::DirectoryList),
            &paths(&["sub"]),
            dir.path(),
            STRICT,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_plain_strings_skip_checks() {
        let dir = tempdir().unwrap();
        let result = check_paths(
            &ParameterSchema::new(DType::Str),
            &paths(&["-O2", "nonexistent"]),
            dir.path(),
            STRICT,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_choices_checked_for_every_dtype() {
        let dir = tempdir().unwrap();
        let mode = ParameterSchema::new(DType::Str).with_choices(["fast", "slow"]);
        assert!(check_paths(&mode, &paths(&["fast"]), dir.path(), LOOSE).is_ok());

        let err = check_paths(&mode, &paths(&["medium"]), dir.path(), LOOSE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidChoice);
        assert!(err.message.contains("'medium'"));

        fs::write(dir.path().join("b.cfg"), "x").unwrap();
        let config = ParameterSchema::file().with_choices(["a.cfg"]);
        let err = check_paths(&config, &paths(&["b.cfg"]), dir.path(), STRICT).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidChoice);
    }

    #[test]
    fn test_ensure_parent_directories() {
        let dir = tempdir().unwrap();
        ensure_parent_directories(&paths(&["build/obj/main.o", "top.txt", ""]), dir.path()).unwrap();
        assert!(dir.path().join("build/obj").is_dir());
    }
}
