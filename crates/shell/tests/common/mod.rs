// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tern_core::ast::{Assignment, Redirect, RedirectOp, SimpleCommand, Word, WordPart};
use tern_core::{is_identifier, Node, ShellConfig};
use tern_shell::{Builtin, ScriptParser, Shell, Unwind};

/// `;`-separated lines of plain words, as in a hand-written script.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lines;

impl ScriptParser for Lines {
    fn parse(&self, text: &str, _file: &str) -> Result<Node, String> {
        let commands: Vec<Node> = text
            .split([';', '\n'])
            .filter(|l| !l.trim().is_empty())
            .map(line)
            .collect();
        if commands.is_empty() {
            return Err("empty script".to_string());
        }
        Ok(Node::sequence(commands))
    }
}

/// One simple command. `name=value` prefixes become assignments, `$name` a
/// parameter and `"$@"` the positionals.
pub fn line(text: &str) -> Node {
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

pub fn script(lines: &[&str]) -> Node {
    Node::sequence(lines.iter().copied().map(line))
}

/// `sh -c text`, for programs whose behaviour the tests pin down.
pub fn sh_c(text: &str) -> Node {
    Node::command(["sh", "-c", text])
}

pub fn shell() -> Shell {
    shell_with(ShellConfig::default())
}

pub fn shell_with(config: ShellConfig) -> Shell {
    Shell::builder()
        .config(config)
        .env([("PATH", "/usr/bin:/bin"), ("HOME", "/")])
        .parser(Lines)
        .build()
}

pub fn write_to(path: &Path) -> Redirect {
    Redirect::new(RedirectOp::Write, path.to_str().unwrap_or_default())
}

pub fn read_from(path: &Path) -> Redirect {
    Redirect::new(RedirectOp::Read, path.to_str().unwrap_or_default())
}

/// Run `tree` with its standard output sent to a temporary file and return
/// the status and what was written.
pub fn capture(sh: &mut Shell, tree: Node) -> (i32, String) {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("stdout");
    let status = sh.run(&Node::redirected(tree, [write_to(&out)]));
    let text = fs::read_to_string(&out).unwrap_or_default();
    (status, text)
}

/// Target of one of this process's descriptors.
pub fn fd_target(fd: i32) -> Option<std::path::PathBuf> {
    fs::read_link(format!("/proc/self/fd/{fd}")).ok()
}

/// Built-in that appends its arguments to a shared log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
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

/// Built-in that reads its standard input to the end into `$input`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Slurp;

impl Builtin for Slurp {
    fn name(&self) -> &str {
        "slurp"
    }

    fn run(&self, sh: &mut Shell, _argv: &[String]) -> Result<i32, Unwind> {
        let mut text = String::new();
        if std::io::stdin().lock().read_to_string(&mut text).is_err() {
            return Ok(1);
        }
        sh.set_var("input", text)?;
        Ok(0)
    }
}
