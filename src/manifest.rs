//! Checker options, read from the `[typeck]` table of a `reef.toml`.
//!
//! ```toml
//! [package]
//! name = "shapes"
//!
//! [typeck]
//! complexity-limit = 32
//! check-exhaustiveness = true
//! max-tuple-arity = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::CompileError;

pub const MANIFEST_FILE: &str = "reef.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CheckerOptions {
    /// Budget handed to the usefulness analyzer for each `match`.
    pub complexity_limit: usize,
    pub check_exhaustiveness: bool,
    pub max_tuple_arity: usize,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self { complexity_limit: 15, check_exhaustiveness: true, max_tuple_arity: 10 }
    }
}

#[derive(Deserialize)]
struct TomlManifest {
    #[serde(default)]
    typeck: Option<CheckerOptions>,
}

impl CheckerOptions {
    /// Parses a whole manifest. A missing `[typeck]` table means defaults;
    /// `path` is only used in error messages.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, CompileError> {
        let manifest: TomlManifest = toml::from_str(content).map_err(|e| {
            CompileError::manifest(format!("{MANIFEST_FILE}: invalid [typeck] table: {e}"), path.to_path_buf())
        })?;
        let options = manifest.typeck.unwrap_or_default();
        options.validate(path)?;
        Ok(options)
    }

    pub fn from_path(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::manifest(format!("{MANIFEST_FILE}: could not read file: {e}"), path.to_path_buf())
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Options from the nearest `reef.toml` at or above `start_dir`, or the
    /// defaults when there is none.
    pub fn discover(start_dir: &Path) -> Result<Self, CompileError> {
        match find_manifest(start_dir) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self, path: &Path) -> Result<(), CompileError> {
        if self.complexity_limit == 0 {
            return Err(CompileError::manifest(
                format!("{MANIFEST_FILE}: complexity-limit must be at least 1"),
                path.to_path_buf(),
            ));
        }
        if self.max_tuple_arity < 2 {
            return Err(CompileError::manifest(
                format!("{MANIFEST_FILE}: max-tuple-arity must be at least 2, got {}", self.max_tuple_arity),
                path.to_path_buf(),
            ));
        }
        Ok(())
    }
}

/// Walks from `start_dir` up to a `.git` boundary or the filesystem root.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").exists() || !dir.pop() {
            return None;
        }
    }
}
