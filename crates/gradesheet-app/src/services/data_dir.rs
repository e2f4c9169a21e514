// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config directory resolution and key search locations.

use std::path::{Path, PathBuf};

use gradesheet_core::config::CONFIG_FILE_NAME;

/// Return the application config directory. Not created here.
pub fn config_dir() -> PathBuf {
    config_base(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
    .join("gradesheet")
}

/// Default location of `exam_config.json`.
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Directories searched for `secret.key` before the config dir: mounted
/// removable media, then the working directory.
pub fn key_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(user) = std::env::var_os("USER") {
        for root in [Path::new("/media"), Path::new("/run/media")] {
            dirs.extend(mounted_volumes(&root.join(&user)));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    dirs
}

fn mounted_volumes(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut volumes: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    volumes.sort();
    volumes
}

fn config_base(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    // Try XDG config dir, then fallback to home
    if let Some(xdg) = xdg.filter(|p| !p.as_os_str().is_empty()) {
        return xdg;
    }
    if let Some(home) = home {
        return home.join(".config");
    }
    // Last resort
    PathBuf::from(".")
}
