//! Route path patterns.
//!
//! # Responsibility
//! - Compile composed route paths into matchers.
//! - Memoize compiled matchers per path string.

pub mod compiler;
