// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Convenience constructors for building trees by hand.

use std::sync::Arc;

use crate::Location;

use super::{
    ArithCommand, ArithExpr, Assignment, CaseArm, CaseClause, CasePattern, ForLoop, ForkCommand,
    FunctionDef, IfClause, Node, Redirect, RedirectCommand, SimpleCommand, TestCommand, TestExpr,
    WhileLoop, Word,
};

impl Node {
    /// A simple command made of literal words.
    pub fn command<I, S>(words: I) -> Node
    where
        I: IntoIterator<Item = S>,
        S: Into<Word>,
    {
        Node::Simple(SimpleCommand {
            words: words.into_iter().map(Into::into).collect(),
            ..SimpleCommand::default()
        })
    }

    /// A bare assignment `name=value`.
    pub fn assign(name: impl Into<String>, value: impl Into<Word>) -> Node {
        Node::Simple(SimpleCommand {
            assignments: vec![Assignment::new(name, value)],
            ..SimpleCommand::default()
        })
    }

    pub fn sequence(nodes: impl IntoIterator<Item = Node>) -> Node {
        Node::Sequence(nodes.into_iter().collect())
    }

    pub fn pipeline(stages: impl IntoIterator<Item = Node>) -> Node {
        Node::Pipeline(stages.into_iter().collect())
    }

    pub fn and(left: Node, right: Node) -> Node {
        Node::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Node, right: Node) -> Node {
        Node::Or(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(body: Node) -> Node {
        Node::Not(Box::new(body))
    }

    pub fn subshell(body: Node) -> Node {
        Node::Subshell(Box::new(body))
    }

    pub fn background(body: Node) -> Node {
        Node::Fork(ForkCommand {
            body: Box::new(body),
            background: true,
            location: Default::default(),
        })
    }

    pub fn redirected(body: Node, redirects: impl IntoIterator<Item = Redirect>) -> Node {
        Node::Redirect(RedirectCommand {
            body: Box::new(body),
            redirects: redirects.into_iter().collect(),
            location: Default::default(),
        })
    }

    pub fn if_then(test: Node, then: Node, otherwise: Option<Node>) -> Node {
        Node::If(IfClause {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        })
    }

    pub fn for_in<I, S>(var: impl Into<String>, words: I, body: Node) -> Node
    where
        I: IntoIterator<Item = S>,
        S: Into<Word>,
    {
        Node::For(ForLoop {
            var: var.into(),
            words: Some(words.into_iter().map(Into::into).collect()),
            body: Box::new(body),
            location: Default::default(),
        })
    }

    pub fn while_do(test: Node, body: Node) -> Node {
        Node::While(WhileLoop {
            until: false,
            test: Box::new(test),
            body: Box::new(body),
            step: None,
            location: Default::default(),
        })
    }

    pub fn until_do(test: Node, body: Node) -> Node {
        Node::While(WhileLoop {
            until: true,
            test: Box::new(test),
            body: Box::new(body),
            step: None,
            location: Default::default(),
        })
    }

    pub fn arith(expr: ArithExpr) -> Node {
        Node::Arith(ArithCommand {
            expr,
            location: Default::default(),
        })
    }

    pub fn test(expr: TestExpr) -> Node {
        Node::Test(TestCommand {
            expr,
            negate: false,
            location: Default::default(),
        })
    }

    pub fn time(body: Option<Node>) -> Node {
        Node::Time(body.map(Box::new))
    }

    pub fn function(name: impl Into<String>, body: Node) -> Node {
        Node::Function(FunctionDef {
            name: name.into(),
            body: Arc::new(body),
            location: Default::default(),
        })
    }

    pub fn case(subject: impl Into<Word>, arms: impl IntoIterator<Item = CaseArm>) -> Node {
        Node::Case(CaseClause {
            subject: subject.into(),
            arms: arms.into_iter().collect(),
            location: Default::default(),
        })
    }

    /// Add redirections: appended to a simple command, wrapped around
    /// anything else.
    pub fn with_redirects(self, redirects: impl IntoIterator<Item = Redirect>) -> Node {
        match self {
            Node::Simple(mut cmd) => {
                cmd.redirects.extend(redirects);
                Node::Simple(cmd)
            }
            other => Node::redirected(other, redirects),
        }
    }

    /// Attach a source line to nodes that carry a location.
    pub fn at_line(mut self, line: u32) -> Node {
        let loc = Location::line(line);
        match &mut self {
            Node::Simple(cmd) => cmd.location = loc,
            Node::Fork(fork) => fork.location = loc,
            Node::Redirect(r) => r.location = loc,
            Node::For(f) => f.location = loc,
            Node::While(w) => w.location = loc,
            Node::Arith(a) => a.location = loc,
            Node::Case(c) => c.location = loc,
            Node::Function(f) => f.location = loc,
            Node::Test(t) => t.location = loc,
            _ => {}
        }
        self
    }
}

impl WhileLoop {
    /// `for ((init; cond; step)) body` as `init ; while ((cond)) body; step`.
    pub fn arith_for(init: ArithExpr, cond: ArithExpr, step: ArithExpr, body: Node) -> Node {
        Node::Sequence(vec![
            Node::arith(init),
            Node::While(WhileLoop {
                until: false,
                test: Box::new(Node::arith(cond)),
                body: Box::new(body),
                step: Some(step),
                location: Default::default(),
            }),
        ])
    }
}

impl CaseArm {
    pub fn new<I, S>(patterns: I, body: Option<Node>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Word>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|word| CasePattern {
                    word: word.into(),
                    raw: false,
                })
                .collect(),
            body,
            fallthrough: false,
        }
    }

    pub fn fallthrough(mut self) -> Self {
        self.fallthrough = true;
        self
    }
}
