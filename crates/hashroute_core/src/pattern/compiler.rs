//! Path pattern compilation.
//!
//! # Responsibility
//! - Turn a composed route path into a compiled matcher.
//! - Keep anchoring and separator escaping rules in one place.
//!
//! # Invariants
//! - Matching is anchored at the start of the location only.
//! - There is no end anchor: a path that is a prefix of the location matches,
//!   which keeps ancestor routes mounted while nested routes narrow further.
//! - Every `/` is escaped before compilation. No other character is touched.

use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Path separator that is always treated literally.
pub const PATH_SEPARATOR: char = '/';

/// Result type used by pattern compilation.
pub type PatternResult<T> = Result<T, PatternError>;

/// Errors from pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The escaped pattern is not valid matcher syntax.
    InvalidSyntax { path: String, message: String },
}

impl Display for PatternError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSyntax { path, message } => {
                write!(f, "route path `{path}` is not a valid pattern: {message}")
            }
        }
    }
}

impl Error for PatternError {}

/// Compiled, start-anchored matcher for one route path.
///
/// Cloning is cheap; the compiled program is shared.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    source_path: String,
    regex: Regex,
}

impl RouteMatcher {
    /// Returns whether `location` starts with a match of this pattern.
    pub fn is_match(&self, location: &str) -> bool {
        self.regex.is_match(location)
    }

    /// Returns the path this matcher was compiled from.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Returns the final anchored pattern text.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Stateless compiler from route paths to matchers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternCompiler;

impl PatternCompiler {
    /// Compiles `path` into a start-anchored matcher.
    ///
    /// # Errors
    /// - Returns `InvalidSyntax` when characters other than `/` form
    ///   invalid matcher syntax. Escaping those is the caller's job.
    pub fn compile(path: &str) -> PatternResult<RouteMatcher> {
        let pattern = anchored_pattern(path);
        match Regex::new(&pattern) {
            Ok(regex) => Ok(RouteMatcher {
                source_path: path.to_string(),
                regex,
            }),
            Err(err) => {
                warn!(
                    "event=pattern_compile module=pattern status=error path={} error={}",
                    path, err
                );
                Err(PatternError::InvalidSyntax {
                    path: path.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }
}

/// Memoizing front of [`PatternCompiler`] keyed by path text.
///
/// Compilation is pure, so entries never go stale.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: HashMap<String, RouteMatcher>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cached matcher for `path`, compiling it on first use.
    pub fn get_or_compile(&mut self, path: &str) -> PatternResult<RouteMatcher> {
        if let Some(matcher) = self.entries.get(path) {
            return Ok(matcher.clone());
        }
        let matcher = PatternCompiler::compile(path)?;
        debug!(
            "event=pattern_compile module=pattern status=ok path={} pattern={}",
            path,
            matcher.as_str()
        );
        self.entries.insert(path.to_string(), matcher.clone());
        Ok(matcher)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn anchored_pattern(path: &str) -> String {
    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('^');
    for c in path.chars() {
        if c == PATH_SEPARATOR {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern
}
