// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exam key files. The key is a passphrase stored as text in `secret.key`,
// looked up on removable media first, then locally; a fresh one is
// generated when none exists.

use std::fmt;
use std::path::{Path, PathBuf};

use gradesheet_core::error::GradesheetError;
use tracing::{info, instrument};
use uuid::Uuid;

pub const KEY_FILE_NAME: &str = "secret.key";

/// Where the key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Found(PathBuf),
    Generated(PathBuf),
}

impl KeySource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Found(path) | Self::Generated(path) => path,
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(path) => write!(f, "key loaded from {}", path.display()),
            Self::Generated(path) => write!(f, "new key generated at {}", path.display()),
        }
    }
}

/// Read a key file. Surrounding whitespace is ignored.
pub fn read_key(path: &Path) -> Result<String, GradesheetError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GradesheetError::KeyError(format!("cannot read {}: {e}", path.display())))?;
    let key = text.trim();
    if key.is_empty() {
        return Err(GradesheetError::KeyError(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

/// Load the first `secret.key` found in `search_dirs`, then in
/// `fallback_dir`. If none exists, generate one in `fallback_dir`.
#[instrument(skip_all, fields(fallback = %fallback_dir.display()))]
pub fn load_key(
    search_dirs: &[PathBuf],
    fallback_dir: &Path,
) -> Result<(String, KeySource), GradesheetError> {
    let candidates = search_dirs
        .iter()
        .map(|dir| dir.join(KEY_FILE_NAME))
        .chain(std::iter::once(fallback_dir.join(KEY_FILE_NAME)));

    for path in candidates {
        if path.is_file() {
            let key = read_key(&path)?;
            info!(path = %path.display(), "Exam key loaded");
            return Ok((key, KeySource::Found(path)));
        }
    }

    let path = fallback_dir.join(KEY_FILE_NAME);
    let key = generate_key();
    std::fs::create_dir_all(fallback_dir)?;
    std::fs::write(&path, &key)
        .map_err(|e| GradesheetError::KeyError(format!("cannot write {}: {e}", path.display())))?;
    info!(path = %path.display(), "New exam key generated");
    Ok((key, KeySource::Generated(path)))
}

/// A random 64 hex character passphrase.
pub fn generate_key() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
