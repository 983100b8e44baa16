// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;
use tern_core::ast::{Assignment, SimpleCommand, Word, WordPart};
use tern_core::{is_identifier, Node, ShellConfig};

use crate::builtins::Builtin;
use crate::shell::{ScriptParser, Shell};
use crate::unwind::Unwind;

/// Parses `;`-separated lines of plain words. `name=value` prefixes become
/// assignments, `$name` a parameter and `"$@"` the positionals.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LineParser;

impl ScriptParser for LineParser {
    fn parse(&self, text: &str, _file: &str) -> Result<Node, String> {
        let mut commands: Vec<Node> = text
            .split([';', '\n'])
            .filter(|line| !line.trim().is_empty())
            .map(line)
            .collect();
        match commands.len() {
            0 => Err("empty script".to_string()),
            1 => Ok(commands.remove(0)),
            _ => Ok(Node::sequence(commands)),
        }
    }
}

/// One command line as a simple command.
pub(crate) fn line(text: &str) -> Node {
    let mut cmd = SimpleCommand::default();
    for token in text.split_whitespace() {
        match token.split_once('=') {
            Some((name, value)) if cmd.words.is_empty() && is_identifier(name) => {
                cmd.assignments.push(Assignment::new(name, word(value)));
            }
            _ => cmd.words.push(word(token)),
        }
    }
    Node::Simple(cmd)
}

fn word(token: &str) -> Word {
    if token == "\"$@\"" {
        return Word {
            parts: vec![WordPart::AllArgs],
        };
    }
    match token.strip_prefix('$') {
        Some(name) if !name.is_empty() => Word::param(name),
        _ => Word::literal(token),
    }
}

/// A non-interactive shell with a fixed environment and the line parser.
pub(crate) fn shell() -> Shell {
    shell_with(ShellConfig::default())
}

pub(crate) fn shell_with(config: ShellConfig) -> Shell {
    Shell::builder()
        .config(config)
        .env([("PATH", "/usr/bin:/bin"), ("HOME", "/")])
        .parser(LineParser)
        .seed(7)
        .build()
}

/// Built-in that appends its arguments to a shared log.
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn entries(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

impl Builtin for Recorder {
    fn name(&self) -> &str {
        "record"
    }

    fn run(&self, _sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
        self.log.lock().push(argv[1..].join(" "));
        Ok(0)
    }
}
