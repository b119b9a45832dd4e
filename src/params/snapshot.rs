//! Parameter Snapshots
//!
//! A snapshot is taken once, when a step is declared, and holds the
//! declarations exactly as decoded. Every validation phase starts from a
//! fresh copy of it, so expanded values never leak into the next phase.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use super::marker::{GlobMarker, ParameterValue, RawValue};
use crate::error::PhaseError;
use crate::recipe::model::Step;

/// Mapping from parameter name to value.
pub type ParameterSet = BTreeMap<String, ParameterValue>;

/// Immutable copy of a step's declared parameters.
///
/// Cloning is cheap and the snapshot may be shared between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSnapshot {
    params: Arc<ParameterSet>,
}

impl ParameterSnapshot {
    /// Returns an owned copy of the pristine declarations.
    pub fn restore(&self) -> ParameterSet {
        ParameterSet::clone(&self.params)
    }

    /// Looks up one declared value without copying the set.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.params.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Re-encodes the declarations into their schema-boundary form.
    pub fn encode(&self, marker: &GlobMarker) -> BTreeMap<String, RawValue> {
        self.params
            .iter()
            .map(|(name, value)| (name.clone(), marker.encode(value)))
            .collect()
    }
}

/// Deep-copies a declared parameter set before any expansion happens.
pub fn snapshot(params: &ParameterSet) -> ParameterSnapshot {
    debug!("Snapshotting {} parameter(s)", params.len());
    ParameterSnapshot {
        params: Arc::new(params.clone()),
    }
}

/// Returns the step's pristine declarations.
pub fn restore(step: &Step) -> Result<ParameterSet, PhaseError> {
    step.snapshot()
        .map(ParameterSnapshot::restore)
        .ok_or_else(|| PhaseError::SnapshotMissing {
            step: step.id.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("objects".to_string(), ParameterValue::glob("build/*.o"));
        params.insert("config".to_string(), ParameterValue::literal("build.cfg"));
        params
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut params = sample_set();
        let snap = snapshot(&params);

        params.insert(
            "objects".to_string(),
            ParameterValue::Literal(vec!["build/x.o".to_string()]),
        );

        assert_eq!(snap.get("objects"), Some(&ParameterValue::glob("build/*.o")));
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn test_restore_is_value_equal() {
        let snap = snapshot(&sample_set());
        let first = snap.restore();
        let mut second = snap.restore();
        assert_eq!(first, second);

        second.clear();
        assert_eq!(snap.restore(), first);
    }

    #[test]
    fn test_encode_snapshot() {
        let snap = snapshot(&sample_set());
        let encoded = snap.encode(&GlobMarker::default());
        assert_eq!(encoded["objects"], RawValue::from("glob:build/*.o"));
        assert_eq!(encoded["config"], RawValue::from("build.cfg"));
    }

    #[test]
    fn test_restore_undeclared_step() {
        let step = Step::new("never_declared");
        let result = restore(&step);
        assert!(matches!(result, Err(PhaseError::SnapshotMissing { .. })));
    }

    #[test]
    fn test_snapshot_names() {
        let snap = snapshot(&sample_set());
        let names: Vec<&str> = snap.names().collect();
        assert_eq!(names, vec!["config", "objects"]);
        assert!(!snap.is_empty());
    }
}
