//! Navigation location sources.
//!
//! # Responsibility
//! - Expose the current location string matched by routes.
//! - Provide an in-memory source that tests and the CLI can navigate.
//!
//! # Invariants
//! - Core only reads the location; it never parses or rewrites it.

/// Read-only view of the current navigation location.
pub trait LocationSource {
    /// Returns the current location, e.g. `#/home/settings`.
    fn current(&self) -> &str;
}

/// In-memory location, mutated explicitly by its owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLocation {
    current: String,
}

impl MemoryLocation {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
        }
    }

    /// Builds a location from a full URL, keeping only its hash fragment.
    pub fn from_url(url: &str) -> Self {
        Self::new(hash_of(url))
    }

    /// Replaces the current location.
    pub fn set(&mut self, location: impl Into<String>) {
        self.current = location.into();
    }
}

impl LocationSource for MemoryLocation {
    fn current(&self) -> &str {
        &self.current
    }
}

/// Extracts the `#...` fragment of `url`.
///
/// A missing fragment and a bare `#` both yield an empty string.
pub fn hash_of(url: &str) -> &str {
    match url.find('#') {
        Some(index) if index + 1 < url.len() => &url[index..],
        _ => "",
    }
}
