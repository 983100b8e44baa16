// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural validation of command trees.
//!
//! The parser collaborator is trusted for syntax, but trees can also arrive
//! hand-built or deserialized. This pass catches shapes the engine refuses
//! to run.

use thiserror::Error;

use crate::ast::{Node, Redirect, SimpleCommand, TreeVisitor};
use crate::Location;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{location}: `{name}` is not a valid function name")]
    BadFunctionName { name: String, location: Location },

    #[error("{location}: `{name}` is not a valid identifier")]
    BadIdentifier { name: String, location: Location },

    #[error("{location}: pipeline needs at least two stages, found {stages}")]
    ShortPipeline { stages: usize, location: Location },

    #[error("{location}: empty command list")]
    EmptySequence { location: Location },

    #[error("{location}: descriptor {fd} out of range 0..=9")]
    BadDescriptor { fd: i32, location: Location },

    #[error("{location}: nesting depth {depth} exceeds maximum {max}")]
    ExcessiveNesting {
        depth: usize,
        max: usize,
        location: Location,
    },
}

/// Configuration for validation strictness.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    /// Maximum allowed compound nesting depth (0 = unlimited).
    pub max_nesting_depth: usize,
}

/// Validate a tree, collecting every problem found.
///
/// ```
/// use tern_core::ast::Node;
/// use tern_core::validate;
///
/// assert!(validate(&Node::command(["echo", "hi"])).is_ok());
/// assert!(validate(&Node::pipeline([Node::command(["ls"])])).is_err());
/// ```
pub fn validate(tree: &Node) -> Result<(), Vec<ValidationError>> {
    validate_with_config(tree, ValidatorConfig::default())
}

pub fn validate_with_config(
    tree: &Node,
    config: ValidatorConfig,
) -> Result<(), Vec<ValidationError>> {
    let mut validator = Validator {
        config,
        errors: Vec::new(),
        current_depth: 0,
        location: Location::default(),
    };
    validator.visit_node(tree);
    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(validator.errors)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Function names are more permissive than variables: anything without
/// whitespace, `/`, `=` or shell metacharacters.
pub fn is_function_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || "/=;&|<>()$`'\"\\".contains(c))
}

struct Validator {
    config: ValidatorConfig,
    errors: Vec<ValidationError>,
    current_depth: usize,
    location: Location,
}

impl Validator {
    fn report(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    fn check_redirects(&mut self, redirects: &[Redirect]) {
        for redirect in redirects {
            let fd = redirect.target_fd();
            if !(0..=9).contains(&fd) {
                self.report(ValidationError::BadDescriptor {
                    fd,
                    location: self.location,
                });
            }
        }
    }
}

impl TreeVisitor for Validator {
    fn visit_node(&mut self, node: &Node) {
        self.location = node.location().or(self.location);
        let compound = !matches!(node, Node::Simple(_));
        if compound {
            self.current_depth += 1;
            let max = self.config.max_nesting_depth;
            if max > 0 && self.current_depth == max + 1 {
                self.report(ValidationError::ExcessiveNesting {
                    depth: self.current_depth,
                    max,
                    location: self.location,
                });
            }
        }

        match node {
            Node::Pipeline(stages) if stages.len() < 2 => {
                self.report(ValidationError::ShortPipeline {
                    stages: stages.len(),
                    location: self.location,
                });
            }
            Node::Sequence(nodes) if nodes.is_empty() => {
                self.report(ValidationError::EmptySequence {
                    location: self.location,
                });
            }
            Node::Function(def) if !is_function_name(&def.name) => {
                self.report(ValidationError::BadFunctionName {
                    name: def.name.clone(),
                    location: def.location,
                });
            }
            Node::For(for_loop) if !is_identifier(&for_loop.var) => {
                self.report(ValidationError::BadIdentifier {
                    name: for_loop.var.clone(),
                    location: for_loop.location,
                });
            }
            Node::Redirect(wrapper) => self.check_redirects(&wrapper.redirects),
            _ => {}
        }

        self.walk_node(node);
        if compound {
            self.current_depth -= 1;
        }
    }

    fn visit_simple(&mut self, cmd: &SimpleCommand) {
        for assignment in &cmd.assignments {
            if !is_identifier(&assignment.name) {
                self.report(ValidationError::BadIdentifier {
                    name: assignment.name.clone(),
                    location: self.location,
                });
            }
        }
        self.check_redirects(&cmd.redirects);
        self.walk_simple(cmd);
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
