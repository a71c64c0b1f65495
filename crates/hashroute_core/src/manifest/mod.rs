//! Declarative route manifests.
//!
//! A manifest describes registries, their nested routes and the text payload
//! of each route. It is the configuration surface used by the CLI.
//!
//! # Invariants
//! - A manifest declares at least one registry.
//! - Route paths contain no whitespace. Empty paths are allowed.
//! - Content labels are not blank.

mod build;

pub use build::{build_into, build_tree};

use crate::config::RouterConfig;
use crate::tree::RouteError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Root manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteManifest {
    pub config: RouterConfig,
    pub registries: Vec<RegistryDecl>,
}

/// One registry and the routes declared directly inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryDecl {
    pub routes: Vec<RouteDecl>,
}

/// One route: its own fragment, text payload and nested routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDecl {
    pub path: String,
    pub content: Vec<String>,
    pub children: Vec<RouteDecl>,
}

impl RouteDecl {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, label: impl Into<String>) -> Self {
        self.content.push(label.into());
        self
    }

    pub fn with_child(mut self, child: RouteDecl) -> Self {
        self.children.push(child);
        self
    }
}

impl RouteManifest {
    /// Parses and validates a JSON manifest.
    pub fn from_json_str(raw: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(raw).map_err(ManifestError::Json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads, parses and validates a JSON manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(ManifestError::Io)?;
        Self::from_json_str(&raw)
    }

    /// Validates declaration-level invariants.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.registries.is_empty() {
            return Err(ManifestValidationError::MissingRegistries);
        }
        if self.config.root_prefix.chars().any(char::is_whitespace) {
            return Err(ManifestValidationError::InvalidRootPrefix(
                self.config.root_prefix.clone(),
            ));
        }
        for registry in &self.registries {
            for route in &registry.routes {
                validate_route(route)?;
            }
        }
        Ok(())
    }

    /// Total number of routes across all registries.
    pub fn route_count(&self) -> usize {
        fn count(route: &RouteDecl) -> usize {
            1 + route.children.iter().map(count).sum::<usize>()
        }
        self.registries
            .iter()
            .flat_map(|registry| registry.routes.iter())
            .map(count)
            .sum()
    }
}

fn validate_route(route: &RouteDecl) -> Result<(), ManifestValidationError> {
    if route.path.chars().any(char::is_whitespace) {
        return Err(ManifestValidationError::InvalidPath(route.path.clone()));
    }
    if route.content.iter().any(|label| label.trim().is_empty()) {
        return Err(ManifestValidationError::BlankContent(route.path.clone()));
    }
    route.children.iter().try_for_each(validate_route)
}

/// Manifest validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    MissingRegistries,
    InvalidRootPrefix(String),
    InvalidPath(String),
    BlankContent(String),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRegistries => write!(f, "manifest must declare at least one registry"),
            Self::InvalidRootPrefix(value) => {
                write!(f, "manifest root prefix must not contain whitespace: {value:?}")
            }
            Self::InvalidPath(value) => {
                write!(f, "route path must not contain whitespace: {value:?}")
            }
            Self::BlankContent(path) => {
                write!(f, "route {path:?} declares blank content")
            }
        }
    }
}

impl Error for ManifestValidationError {}

/// Errors from loading or instantiating a manifest.
#[derive(Debug)]
pub enum ManifestError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Validation(ManifestValidationError),
    Route(RouteError),
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read manifest: {err}"),
            Self::Json(err) => write!(f, "failed to parse manifest: {err}"),
            Self::Validation(err) => write!(f, "invalid manifest: {err}"),
            Self::Route(err) => write!(f, "failed to build routes: {err}"),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Route(err) => Some(err),
        }
    }
}

impl From<ManifestValidationError> for ManifestError {
    fn from(value: ManifestValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RouteError> for ManifestError {
    fn from(value: RouteError) -> Self {
        Self::Route(value)
    }
}
