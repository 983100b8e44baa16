// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Word expansion: literal text, parameters, `$@` and `$*`.
//!
//! There is no field splitting or globbing. A word yields exactly one field
//! unless it contains `"$@"`, which yields one field per positional
//! parameter (and none at all when the word is only `"$@"` and there are no
//! positionals).

use rand::Rng;
use tern_core::ast::{Word, WordPart};

use crate::error::ExecError;
use crate::shell::Shell;

impl Shell {
    /// Expand a word into fields.
    pub fn expand_word(&mut self, word: &Word) -> Result<Vec<String>, ExecError> {
        if let [WordPart::AllArgs] = word.parts.as_slice() {
            return Ok(self.scopes.current().positionals.clone());
        }
        let mut fields: Vec<String> = vec![String::new()];
        for part in &word.parts {
            match part {
                WordPart::Literal(text) => push_text(&mut fields, text),
                WordPart::Param(name) => {
                    let value = self.param(name)?;
                    push_text(&mut fields, &value);
                }
                WordPart::AllArgsJoined => {
                    let joined = self.joined_positionals();
                    push_text(&mut fields, &joined);
                }
                WordPart::AllArgs => {
                    let args = self.scopes.current().positionals.clone();
                    let Some((first, rest)) = args.split_first() else {
                        continue;
                    };
                    push_text(&mut fields, first);
                    fields.extend(rest.iter().cloned());
                }
            }
        }
        Ok(fields)
    }

    /// Expand every word and concatenate the fields.
    pub fn expand_words(&mut self, words: &[Word]) -> Result<Vec<String>, ExecError> {
        let mut argv = Vec::with_capacity(words.len());
        for word in words {
            argv.extend(self.expand_word(word)?);
        }
        Ok(argv)
    }

    /// Expand a word where one string is expected (assignments, redirection
    /// targets, case subjects). Multiple fields are joined with spaces.
    pub fn expand_text(&mut self, word: &Word) -> Result<String, ExecError> {
        Ok(self.expand_word(word)?.join(" "))
    }

    /// Value of a named or special parameter. Unset parameters expand to
    /// nothing unless `nounset` is on.
    pub fn param(&mut self, name: &str) -> Result<String, ExecError> {
        if let Some(value) = self.special_param(name) {
            return Ok(value);
        }
        if let Some(value) = self.vars.get(name) {
            return Ok(value.to_string());
        }
        if self.options.nounset {
            return Err(ExecError::Unset {
                name: name.to_string(),
            });
        }
        Ok(String::new())
    }

    /// Whether `name` is set, counting special parameters.
    pub fn param_is_set(&self, name: &str) -> bool {
        match name {
            "?" | "$" | "#" | "0" | "-" | "_" | "RANDOM" | "LINENO" => true,
            "!" => self.last_bg_pid.is_some(),
            _ => match name.parse::<usize>() {
                Ok(0) => true,
                Ok(n) => n <= self.scopes.current().positionals.len(),
                Err(_) => self.vars.is_set(name),
            },
        }
    }

    fn special_param(&mut self, name: &str) -> Option<String> {
        let value = match name {
            "?" => self.exit_status.to_string(),
            "$" => self.pid.to_string(),
            "!" => self
                .last_bg_pid
                .map(|pid| pid.to_string())
                .unwrap_or_default(),
            "#" => self.scopes.current().positionals.len().to_string(),
            "-" => self.options.flags(),
            "_" => self.last_arg.clone(),
            "RANDOM" if !self.vars.is_set("RANDOM") => self.rng.gen_range(0..32768).to_string(),
            "LINENO" if !self.vars.is_set("LINENO") => self.lineno.to_string(),
            _ => {
                let index: usize = name.parse().ok()?;
                if index == 0 {
                    return Some(self.arg0.clone());
                }
                return self
                    .scopes
                    .current()
                    .positionals
                    .get(index - 1)
                    .cloned()
                    .or_else(|| (!self.options.nounset).then(String::new));
            }
        };
        Some(value)
    }

    fn joined_positionals(&self) -> String {
        let separator = match self.vars.get("IFS") {
            Some(ifs) => ifs.chars().next().map(String::from).unwrap_or_default(),
            None => " ".to_string(),
        };
        self.scopes.current().positionals.join(&separator)
    }
}

fn push_text(fields: &mut Vec<String>, text: &str) {
    match fields.last_mut() {
        Some(last) => last.push_str(text),
        None => fields.push(text.to_string()),
    }
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
