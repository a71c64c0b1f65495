//! Router configuration.
//!
//! # Invariants
//! - `root_prefix` is prepended to every root-level route path.
//! - Missing fields fall back to defaults when deserialized.

use serde::{Deserialize, Serialize};

/// Sentinel prefix used when a route has no ancestor route.
pub const DEFAULT_ROOT_PREFIX: &str = "#";

/// Tree-wide routing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix composed in front of root-level route fragments.
    pub root_prefix: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            root_prefix: DEFAULT_ROOT_PREFIX.to_string(),
        }
    }
}
