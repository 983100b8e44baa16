// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command name to file resolution with a per-`PATH` cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(PathBuf),
    /// A file exists but cannot be executed.
    NotExecutable(PathBuf, String),
    NotFound,
}

#[derive(Debug, Default)]
pub struct PathResolver {
    /// `PATH` value the cache was built against.
    path: String,
    cache: HashMap<String, PathBuf>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` against `path` (the current `PATH` value).
    ///
    /// Names containing `/` are used as given.
    pub fn resolve(&mut self, name: &str, path: &str) -> Lookup {
        if name.contains('/') {
            return check(Path::new(name));
        }
        if self.path != path {
            self.cache.clear();
            self.path = path.to_string();
        }
        if let Some(hit) = self.cache.get(name) {
            if is_executable(hit) {
                return Lookup::Found(hit.clone());
            }
            self.cache.remove(name);
        }

        let mut first_denied = None;
        for dir in path.split(':') {
            let dir = if dir.is_empty() { "." } else { dir };
            let candidate = Path::new(dir).join(name);
            match check(&candidate) {
                Lookup::Found(found) => {
                    debug!(name, path = %found.display(), "resolved command");
                    self.cache.insert(name.to_string(), found.clone());
                    return Lookup::Found(found);
                }
                denied @ Lookup::NotExecutable(..) => {
                    first_denied.get_or_insert(denied);
                }
                Lookup::NotFound => {}
            }
        }
        first_denied.unwrap_or(Lookup::NotFound)
    }

    /// Search `path` for a readable file, as `.` does.
    pub fn find_file(&self, name: &str, path: &str) -> Option<PathBuf> {
        if name.contains('/') {
            return Some(PathBuf::from(name));
        }
        path.split(':')
            .map(|dir| Path::new(if dir.is_empty() { "." } else { dir }).join(name))
            .find(|candidate| candidate.is_file())
    }

    pub fn forget(&mut self) {
        self.cache.clear();
    }
}

fn check(candidate: &Path) -> Lookup {
    let Ok(meta) = candidate.metadata() else {
        return Lookup::NotFound;
    };
    if meta.is_dir() {
        return Lookup::NotExecutable(candidate.to_path_buf(), "Is a directory".to_string());
    }
    match access(candidate, AccessFlags::X_OK) {
        Ok(()) => Lookup::Found(candidate.to_path_buf()),
        Err(errno) => Lookup::NotExecutable(candidate.to_path_buf(), errno.desc().to_string()),
    }
}

fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
