// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Visitor pattern for traversing the command tree.

use super::{CaseArm, Node, Redirect, SimpleCommand, Word};

/// Visitor trait for traversing the command tree.
///
/// Each `visit_*` method has a corresponding `walk_*` method. The `visit_*`
/// method is called at a node and can call `walk_*` to descend into its
/// children. To stop traversal at a node, don't call `walk_*`.
///
/// # Example: Count Simple Commands
///
/// ```
/// use tern_core::ast::{Node, SimpleCommand, TreeVisitor};
///
/// struct Counter(usize);
///
/// impl TreeVisitor for Counter {
///     fn visit_simple(&mut self, cmd: &SimpleCommand) {
///         self.0 += 1;
///         self.walk_simple(cmd);
///     }
/// }
///
/// let tree = Node::and(Node::command(["true"]), Node::command(["echo", "hi"]));
/// let mut counter = Counter(0);
/// counter.visit_node(&tree);
/// assert_eq!(counter.0, 2);
/// ```
pub trait TreeVisitor {
    fn visit_node(&mut self, node: &Node) {
        self.walk_node(node);
    }

    fn visit_simple(&mut self, cmd: &SimpleCommand) {
        self.walk_simple(cmd);
    }

    fn visit_case_arm(&mut self, arm: &CaseArm) {
        self.walk_case_arm(arm);
    }

    fn visit_word(&mut self, _word: &Word) {}

    fn visit_redirect(&mut self, redirect: &Redirect) {
        self.visit_word(&redirect.target);
    }

    fn walk_node(&mut self, node: &Node) {
        match node {
            Node::Simple(cmd) => self.visit_simple(cmd),
            Node::Fork(fork) => self.visit_node(&fork.body),
            Node::Redirect(wrapper) => {
                self.visit_node(&wrapper.body);
                for redirect in &wrapper.redirects {
                    self.visit_redirect(redirect);
                }
            }
            Node::Subshell(body) | Node::Not(body) => self.visit_node(body),
            Node::Pipeline(nodes) | Node::Sequence(nodes) => {
                for child in nodes {
                    self.visit_node(child);
                }
            }
            Node::And(left, right) | Node::Or(left, right) => {
                self.visit_node(left);
                self.visit_node(right);
            }
            Node::For(for_loop) => {
                for word in for_loop.words.iter().flatten() {
                    self.visit_word(word);
                }
                self.visit_node(&for_loop.body);
            }
            Node::While(while_loop) => {
                self.visit_node(&while_loop.test);
                self.visit_node(&while_loop.body);
            }
            Node::If(clause) => {
                self.visit_node(&clause.test);
                self.visit_node(&clause.then);
                if let Some(otherwise) = &clause.otherwise {
                    self.visit_node(otherwise);
                }
            }
            Node::Case(clause) => {
                self.visit_word(&clause.subject);
                for arm in &clause.arms {
                    self.visit_case_arm(arm);
                }
            }
            Node::Time(body) => {
                if let Some(body) = body {
                    self.visit_node(body);
                }
            }
            Node::Function(def) => self.visit_node(&def.body),
            Node::Arith(_) | Node::Test(_) => {}
        }
    }

    fn walk_simple(&mut self, cmd: &SimpleCommand) {
        for assignment in &cmd.assignments {
            self.visit_word(&assignment.value);
        }
        for word in &cmd.words {
            self.visit_word(word);
        }
        for redirect in &cmd.redirects {
            self.visit_redirect(redirect);
        }
    }

    fn walk_case_arm(&mut self, arm: &CaseArm) {
        for pattern in &arm.patterns {
            self.visit_word(&pattern.word);
        }
        if let Some(body) = &arm.body {
            self.visit_node(body);
        }
    }
}
