// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized command trees.
//!
//! Scripts reach the binary already parsed, as the JSON form of
//! [`tern_core::Node`]. The same form is used for files read by `.` and for
//! `eval` text, through [`JsonParser`].

use std::io::Read;
use std::path::{Path, PathBuf};

use tern_core::{validate, Node, ValidationError};
use tern_shell::ScriptParser;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read a tree from `path`, or from standard input when `path` is `-`.
pub fn load(path: &Path) -> Result<Node, TreeError> {
    let read_error = |source| TreeError::Read {
        path: path.to_path_buf(),
        source,
    };
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(read_error)?;
        text
    } else {
        std::fs::read_to_string(path).map_err(read_error)?
    };
    parse(&text, path)
}

pub fn parse(text: &str, path: &Path) -> Result<Node, TreeError> {
    serde_json::from_str(text).map_err(|source| TreeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// One line per problem, prefixed with the tree's origin.
pub fn describe_problems(origin: &str, errors: &[ValidationError]) -> Vec<String> {
    errors.iter().map(|e| format!("{origin}: {e}")).collect()
}

/// Parser handed to the shell for `.` files and `eval`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ScriptParser for JsonParser {
    fn parse(&self, text: &str, file: &str) -> Result<Node, String> {
        let tree = parse(text, Path::new(file)).map_err(|e| e.to_string())?;
        validate(&tree).map_err(|errors| describe_problems(file, &errors).join("\n"))?;
        Ok(tree)
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
