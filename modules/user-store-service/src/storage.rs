//! Storage directory resolution and filename helpers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const USERS_FILE: &str = "users.csv";
pub const CONTEXTS_DIR: &str = "contexts";

/// Resolve the per-request directory against the configured default and
/// make sure it exists. An empty string counts as absent.
pub fn resolve_dir(directory: Option<&str>, default_dir: &Path) -> io::Result<PathBuf> {
    let dir = match directory.filter(|d| !d.is_empty()) {
        Some(d) => PathBuf::from(d),
        None => default_dir.to_path_buf(),
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn users_csv_path(base: &Path) -> PathBuf {
    base.join(USERS_FILE)
}

/// Replace anything outside `[alphanumeric _ -]` with `_`, then collapse
/// underscore runs.
pub fn sanitize_for_filename(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            ch
        } else {
            '_'
        };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out
}
