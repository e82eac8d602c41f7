//! Size-based rotation of the execution log.
//!
//! `sync.log` is shifted to `sync.log.1` once it reaches the size limit;
//! older copies move up one slot (`.1` → `.2` …) and the oldest beyond
//! [`RotationPolicy::keep`] is deleted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// When and how far to rotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate once the live file is at least this large.
    pub max_bytes: u64,
    /// Number of rotated copies kept next to the live file.
    pub keep: usize,
}

impl Default for RotationPolicy {
    /// 10 MiB, five copies.
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            keep: 5,
        }
    }
}

/// Rotate `log_path` if it has outgrown `policy.max_bytes`.
///
/// Returns `true` if a rotation happened. A missing log file is not an error.
pub fn rotate_if_needed(log_path: &Path, policy: RotationPolicy) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < policy.max_bytes {
        return Ok(false);
    }

    if policy.keep == 0 {
        fs::remove_file(log_path)?;
        return Ok(true);
    }

    let oldest = rotated_path(log_path, policy.keep);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..policy.keep).rev() {
        let from = rotated_path(log_path, n);
        if from.exists() {
            fs::rename(&from, rotated_path(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, rotated_path(log_path, 1))?;
    Ok(true)
}

/// `<dir>/sync.log` → `<dir>/sync.log.<n>`
fn rotated_path(base: &Path, n: usize) -> PathBuf {
    let mut name = base
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "sync.log".into());
    name.push(format!(".{n}"));
    base.with_file_name(name)
}
