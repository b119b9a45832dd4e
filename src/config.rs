//! Glob Policy Configuration
//!
//! Controls how parameter strings are classified as globs or literals and
//! how the input check treats globs.
//!
//! Process-wide defaults are read once from the environment:
//!
//! - `RECIPEGUARD_GLOB_PREFIX`: prefix token for explicit globs (empty disables it)
//! - `RECIPEGUARD_IMPLICIT_GLOBS`: `0`, `false`, `no` or `off` disables
//!   metacharacter detection

use log::info;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Default token marking a string as an explicit glob.
pub const DEFAULT_GLOB_PREFIX: &str = "glob:";

/// Environment variable overriding the prefix token.
pub const PREFIX_ENV_VAR: &str = "RECIPEGUARD_GLOB_PREFIX";

/// Environment variable toggling implicit glob detection.
pub const IMPLICIT_ENV_VAR: &str = "RECIPEGUARD_IMPLICIT_GLOBS";

/// Defaults resolved from the environment on first use.
pub static ENV_DEFAULTS: Lazy<GlobConfig> = Lazy::new(|| {
    let mut config = GlobConfig::default();

    if let Ok(token) = std::env::var(PREFIX_ENV_VAR) {
        if token.is_empty() {
            info!("Glob prefix convention disabled via {}", PREFIX_ENV_VAR);
            config.glob_prefix_token = None;
        } else {
            info!("Using glob prefix '{}' from {}", token, PREFIX_ENV_VAR);
            config.glob_prefix_token = Some(token);
        }
    }

    if let Ok(flag) = std::env::var(IMPLICIT_ENV_VAR) {
        config.implicit_globs = !matches!(
            flag.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        );
        info!("Implicit glob detection: {}", config.implicit_globs);
    }

    config
});

/// Classification and expansion policy shared by every phase.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GlobConfig {
    /// Strings starting with this token are always globs (token stripped).
    /// `None` turns the prefix convention off.
    #[serde(default = "default_prefix")]
    pub glob_prefix_token: Option<String>,

    /// Treat unprefixed strings containing `*`, `?` or `[` as globs.
    #[serde(default = "default_true")]
    pub implicit_globs: bool,

    /// Re-expand input globs during the input check instead of reusing the
    /// prevalidation expansion.
    #[serde(default)]
    pub reexpand_inputs: bool,
}

fn default_prefix() -> Option<String> {
    Some(DEFAULT_GLOB_PREFIX.to_string())
}

fn default_true() -> bool {
    true
}

impl Default for GlobConfig {
    fn default() -> Self {
        Self {
            glob_prefix_token: default_prefix(),
            implicit_globs: true,
            reexpand_inputs: false,
        }
    }
}

impl GlobConfig {
    /// Returns the environment-derived defaults.
    pub fn from_env() -> Self {
        ENV_DEFAULTS.clone()
    }

    /// Only prefixed strings are globs; `file[1].txt` stays a literal.
    pub fn explicit_only() -> Self {
        Self {
            implicit_globs: false,
            ..Self::default()
        }
    }

    /// Sets the prefix token.
    pub fn with_prefix(mut self, token: impl Into<String>) -> Self {
        self.glob_prefix_token = Some(token.into());
        self
    }

    /// Disables the prefix convention.
    pub fn without_prefix(mut self) -> Self {
        self.glob_prefix_token = None;
        self
    }

    /// Enables re-expansion of input globs during the input check.
    pub fn with_input_reexpansion(mut self, enabled: bool) -> Self {
        self.reexpand_inputs = enabled;
        self
    }
}
