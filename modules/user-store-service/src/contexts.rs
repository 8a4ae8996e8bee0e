//! Per-user context logs: one text file per `(name, id)` under `contexts/`.

use crate::storage::{sanitize_for_filename, CONTEXTS_DIR};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path of the context log for `(name, id)`. Creates `base/contexts` if needed.
pub fn context_file(base: &Path, name: &str, id: &str) -> io::Result<PathBuf> {
    let dir = base.join(CONTEXTS_DIR);
    fs::create_dir_all(&dir)?;
    let file_name = format!(
        "{}_{}.txt",
        sanitize_for_filename(name),
        sanitize_for_filename(id)
    );
    Ok(dir.join(file_name))
}

pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Truncate the log to empty. The file exists afterwards.
pub fn clear(path: &Path) -> io::Result<()> {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Failed to remove context file {}: {}", path.display(), e);
        }
    }
    fs::File::create(path)?;
    Ok(())
}

/// All lines in append order; a missing file reads as empty.
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = fs::read(path)?;
    Ok(split_lines(&String::from_utf8_lossy(&bytes)))
}

fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\n' => lines.push(std::mem::take(&mut current)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Best-effort removal; failures are logged and swallowed.
pub fn remove_quietly(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        log::warn!("Failed to remove context file {}: {}", path.display(), e);
    }
}
