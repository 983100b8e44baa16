// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern matching seam used by `case` and `[[ == ]]`.

use glob::{MatchOptions, Pattern};

/// Decides whether a subject string matches a shell pattern.
pub trait PatternMatcher {
    fn matches(&self, subject: &str, pattern: &str) -> bool;
}

/// Default matcher backed by [`glob::Pattern`].
///
/// `*` and `?` match `/` and leading dots, as in `case`. A pattern that fails
/// to compile only matches itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobMatcher;

const CASE_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl PatternMatcher for GlobMatcher {
    fn matches(&self, subject: &str, pattern: &str) -> bool {
        match Pattern::new(pattern) {
            Ok(compiled) => compiled.matches_with(subject, CASE_OPTIONS),
            Err(_) => subject == pattern,
        }
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
