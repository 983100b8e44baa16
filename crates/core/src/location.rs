// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source location attached to command tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Line information carried by nodes that can report diagnostics.
///
/// Line `0` means "unknown"; the parser collaborator fills in real lines.
///
/// # Examples
///
/// ```
/// use tern_core::Location;
///
/// let loc = Location::line(12);
/// assert_eq!(loc.to_string(), "line 12");
/// assert!(Location::default().is_unknown());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location {
    line: u32,
}

impl Location {
    /// Location on a known source line.
    #[inline]
    pub fn line(line: u32) -> Self {
        Self { line }
    }

    /// The source line, or `0` when unknown.
    #[inline]
    pub fn line_number(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }

    /// Prefer `self`, falling back to `other` when this location is unknown.
    pub fn or(self, other: Location) -> Location {
        if self.is_unknown() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)
    }
}

impl From<u32> for Location {
    fn from(line: u32) -> Self {
        Self::line(line)
    }
}
