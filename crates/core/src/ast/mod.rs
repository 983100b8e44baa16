// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command tree produced by the parser collaborator and walked by the engine.
//!
//! Every node is immutable during execution. The one exception is the
//! [`CommandCache`] slot on [`SimpleCommand`], which remembers how the
//! command name resolved last time and is checked against a generation
//! counter before use.
//!
//! ```text
//! Node
//! ├── Simple        assignments, words, redirections
//! ├── Fork          body run in a child (`&`)
//! ├── Redirect      compound body + redirections
//! ├── Subshell      ( body )
//! ├── Pipeline      a | b | c
//! ├── Sequence      a ; b ; c
//! ├── And / Or / Not
//! ├── For / While   loops (while carries an optional arithmetic step)
//! ├── Arith         (( expr ))
//! ├── If / Case
//! ├── Time          time pipeline
//! ├── Function      name() { body }
//! └── Test          [[ expr ]]
//! ```

mod arith;
mod build;
mod cache;
mod test_expr;
mod visitor;
mod word;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Location;

pub use arith::{ArithExpr, ArithOp, ArithUnaryOp};
pub use cache::{CommandCache, Resolution};
pub use test_expr::{TestBinaryOp, TestExpr, TestUnaryOp};
pub use visitor::TreeVisitor;
pub use word::{Assignment, Redirect, RedirectOp, Word, WordPart};

/// A node of the command tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Simple(SimpleCommand),
    Fork(ForkCommand),
    Redirect(RedirectCommand),
    Subshell(Box<Node>),
    Pipeline(Vec<Node>),
    Sequence(Vec<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
    For(ForLoop),
    While(WhileLoop),
    Arith(ArithCommand),
    If(IfClause),
    Case(CaseClause),
    Time(Option<Box<Node>>),
    Function(FunctionDef),
    Test(TestCommand),
}

impl Node {
    /// Source location of the node, when it carries one.
    pub fn location(&self) -> Location {
        match self {
            Node::Simple(cmd) => cmd.location,
            Node::Fork(fork) => fork.location,
            Node::Redirect(redirect) => redirect.location,
            Node::For(f) => f.location,
            Node::While(w) => w.location,
            Node::Arith(a) => a.location,
            Node::Case(c) => c.location,
            Node::Function(f) => f.location,
            Node::Test(t) => t.location,
            Node::If(i) => i.test.location(),
            Node::Subshell(body) | Node::Not(body) => body.location(),
            Node::And(left, _) | Node::Or(left, _) => left.location(),
            Node::Pipeline(nodes) | Node::Sequence(nodes) => {
                nodes.first().map(Node::location).unwrap_or_default()
            }
            Node::Time(body) => body.as_ref().map(|b| b.location()).unwrap_or_default(),
        }
    }

    /// Short lowercase name of the node kind, used in traces.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Simple(_) => "simple",
            Node::Fork(_) => "fork",
            Node::Redirect(_) => "redirect",
            Node::Subshell(_) => "subshell",
            Node::Pipeline(_) => "pipeline",
            Node::Sequence(_) => "sequence",
            Node::And(..) => "and",
            Node::Or(..) => "or",
            Node::Not(_) => "not",
            Node::For(_) => "for",
            Node::While(w) if w.until => "until",
            Node::While(_) => "while",
            Node::Arith(_) => "arith",
            Node::If(_) => "if",
            Node::Case(_) => "case",
            Node::Time(_) => "time",
            Node::Function(_) => "function",
            Node::Test(_) => "test",
        }
    }

    /// Maximum compound nesting below this node (a lone simple command is 0).
    pub fn max_nesting_depth(&self) -> usize {
        struct DepthCounter {
            current: usize,
            max: usize,
        }

        impl TreeVisitor for DepthCounter {
            fn visit_node(&mut self, node: &Node) {
                let compound = !matches!(node, Node::Simple(_));
                if compound {
                    self.current += 1;
                    self.max = self.max.max(self.current);
                }
                self.walk_node(node);
                if compound {
                    self.current -= 1;
                }
            }
        }

        let mut counter = DepthCounter { current: 0, max: 0 };
        counter.visit_node(self);
        counter.max
    }
}

/// `name=value ... word ... redirection ...`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleCommand {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<Assignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirects: Vec<Redirect>,
    #[serde(default)]
    pub location: Location,
    #[serde(skip)]
    pub cache: CommandCache,
}

/// A body executed in a child process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkCommand {
    pub body: Box<Node>,
    /// Started with `&`: the parent does not wait.
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub location: Location,
}

/// Redirections wrapped around a compound command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectCommand {
    pub body: Box<Node>,
    pub redirects: Vec<Redirect>,
    #[serde(default)]
    pub location: Location,
}

/// `for var in words; do body; done`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForLoop {
    pub var: String,
    /// `None` iterates the positional parameters.
    #[serde(default)]
    pub words: Option<Vec<Word>>,
    pub body: Box<Node>,
    #[serde(default)]
    pub location: Location,
}

/// `while test; do body; done` and `until`.
///
/// The arithmetic `for ((init; cond; step))` form is a `Sequence` of the
/// init expression followed by a `While` whose `step` runs after each pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileLoop {
    #[serde(default)]
    pub until: bool,
    pub test: Box<Node>,
    pub body: Box<Node>,
    #[serde(default)]
    pub step: Option<ArithExpr>,
    #[serde(default)]
    pub location: Location,
}

/// `(( expr ))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithCommand {
    pub expr: ArithExpr,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfClause {
    pub test: Box<Node>,
    pub then: Box<Node>,
    #[serde(default, rename = "else")]
    pub otherwise: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub subject: Word,
    pub arms: Vec<CaseArm>,
    #[serde(default)]
    pub location: Location,
}

/// One `pattern | pattern ) body ;;` arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseArm {
    pub patterns: Vec<CasePattern>,
    #[serde(default)]
    pub body: Option<Node>,
    /// Terminated by `;&`: the next arm's body runs without matching.
    #[serde(default)]
    pub fallthrough: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePattern {
    pub word: Word,
    /// Fully quoted pattern, compared literally.
    #[serde(default)]
    pub raw: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub body: Arc<Node>,
    #[serde(default)]
    pub location: Location,
}

/// `[[ expr ]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCommand {
    pub expr: TestExpr,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub location: Location,
}

#[cfg(test)]
#[path = "../ast_tests.rs"]
mod tests;
