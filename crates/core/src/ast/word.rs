// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Words, assignments and redirections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A word before expansion.
///
/// Serialized as a plain string when it is a single literal, otherwise as a
/// list of parts:
///
/// ```
/// use tern_core::ast::{Word, WordPart};
///
/// let w: Word = serde_json::from_str(r#""hello""#).unwrap();
/// assert_eq!(w, Word::literal("hello"));
///
/// let w: Word = serde_json::from_str(r#"[{"literal": "x="}, {"param": "HOME"}]"#).unwrap();
/// assert_eq!(w.parts[1], WordPart::Param("HOME".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "WordRepr", into = "WordRepr")]
pub struct Word {
    pub parts: Vec<WordPart>,
}

/// A piece of a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordPart {
    /// Text taken verbatim.
    Literal(String),
    /// `$name`, `$1`, `$?`, `$#`, `$$`, `$!`, `$_`, `$0`.
    Param(String),
    /// `"$@"`: each positional parameter becomes its own field.
    AllArgs,
    /// `"$*"`: positional parameters joined by a space.
    AllArgsJoined,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WordRepr {
    Text(String),
    Parts(Vec<WordPart>),
}

impl From<WordRepr> for Word {
    fn from(repr: WordRepr) -> Self {
        match repr {
            WordRepr::Text(text) => Word::literal(text),
            WordRepr::Parts(parts) => Word { parts },
        }
    }
}

impl From<Word> for WordRepr {
    fn from(word: Word) -> Self {
        match word.as_literal() {
            Some(text) => WordRepr::Text(text.to_string()),
            None => WordRepr::Parts(word.parts),
        }
    }
}

impl Word {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Literal(text.into())],
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Param(name.into())],
        }
    }

    /// The text of a word made of exactly one literal part.
    pub fn as_literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [WordPart::Literal(text)] => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Word {
    fn from(text: &str) -> Self {
        Word::literal(text)
    }
}

impl From<String> for Word {
    fn from(text: String) -> Self {
        Word::literal(text)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                WordPart::Literal(text) => f.write_str(text)?,
                WordPart::Param(name) => write!(f, "${{{name}}}")?,
                WordPart::AllArgs => f.write_str("\"$@\"")?,
                WordPart::AllArgsJoined => f.write_str("\"$*\"")?,
            }
        }
        Ok(())
    }
}

/// `name=value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    #[serde(default)]
    pub value: Word,
}

impl Assignment {
    pub fn new(name: impl Into<String>, value: impl Into<Word>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A redirection of one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    /// Descriptor being redirected; defaults to the operator's natural fd.
    #[serde(default)]
    pub fd: Option<i32>,
    pub op: RedirectOp,
    /// File name, descriptor number (`<&`, `>&`, `-` to close), or
    /// here-document body.
    pub target: Word,
}

impl Redirect {
    pub fn new(op: RedirectOp, target: impl Into<Word>) -> Self {
        Self {
            fd: None,
            op,
            target: target.into(),
        }
    }

    pub fn with_fd(mut self, fd: i32) -> Self {
        self.fd = Some(fd);
        self
    }

    /// The descriptor this redirection changes.
    pub fn target_fd(&self) -> i32 {
        self.fd.unwrap_or_else(|| self.op.default_fd())
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(fd) = self.fd {
            write!(f, "{fd}")?;
        }
        match self.op {
            RedirectOp::HereDoc => f.write_str("<<EOF"),
            op => write!(f, "{}{}", op.symbol(), self.target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectOp {
    /// `<`
    Read,
    /// `>` (refuses existing files under noclobber)
    Write,
    /// `>|`
    Clobber,
    /// `>>`
    Append,
    /// `<>`
    ReadWrite,
    /// `<>;` truncates the file to the current offset when the redirection
    /// is undone.
    ReadWriteRewrite,
    /// `<&`
    DupRead,
    /// `>&`
    DupWrite,
    /// `<<`
    HereDoc,
}

impl RedirectOp {
    pub fn default_fd(self) -> i32 {
        match self {
            RedirectOp::Read
            | RedirectOp::ReadWrite
            | RedirectOp::ReadWriteRewrite
            | RedirectOp::DupRead
            | RedirectOp::HereDoc => 0,
            RedirectOp::Write | RedirectOp::Clobber | RedirectOp::Append | RedirectOp::DupWrite => 1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RedirectOp::Read => "<",
            RedirectOp::Write => ">",
            RedirectOp::Clobber => ">|",
            RedirectOp::Append => ">>",
            RedirectOp::ReadWrite => "<>",
            RedirectOp::ReadWriteRewrite => "<>;",
            RedirectOp::DupRead => "<&",
            RedirectOp::DupWrite => ">&",
            RedirectOp::HereDoc => "<<",
        }
    }
}
