//! Core engine for hash-based nested route matching.
//! Routes declared in a tree show or hide their payload depending on whether
//! the current location matches the path composed from their ancestors.

pub mod config;
pub mod location;
pub mod logging;
pub mod manifest;
pub mod pattern;
pub mod tree;

pub use config::{RouterConfig, DEFAULT_ROOT_PREFIX};
pub use location::{hash_of, LocationSource, MemoryLocation};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use manifest::{
    build_into, build_tree, ManifestError, ManifestValidationError, RegistryDecl, RouteDecl,
    RouteManifest,
};
pub use pattern::compiler::{
    PatternCache, PatternCompiler, PatternError, PatternResult, RouteMatcher, PATH_SEPARATOR,
};
pub use tree::{MountState, NodeId, NodeRole, RouteError, RouteResult, RouteTree};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
