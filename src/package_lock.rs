//! `package-lock.json` freshness check

use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::staleness::{is_outdated, threshold};
use crate::tree::{FileSystem, Timestamp};

pub const PACKAGE_JSON: &str = "package.json";
pub const PACKAGE_LOCK: &str = "package-lock.json";

/// Result of comparing `package-lock.json` with `package.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockfileStatus {
    Fresh,
    Outdated,
    /// One of the two files does not exist.
    Skipped,
}

/// Check that `package-lock.json` is not older than `package.json` minus the tolerance.
///
/// A missing file skips the check. Any other stat failure is an error.
pub fn check_lockfile<F: FileSystem + ?Sized>(
    fs: &F,
    root: &Path,
    tolerance_ms: u64,
) -> Result<LockfileStatus> {
    let Some(manifest) = stat_if_exists(fs, &root.join(PACKAGE_JSON))? else {
        return Ok(LockfileStatus::Skipped);
    };
    let Some(lockfile) = stat_if_exists(fs, &root.join(PACKAGE_LOCK))? else {
        return Ok(LockfileStatus::Skipped);
    };

    if is_outdated(lockfile, threshold(manifest, tolerance_ms)) {
        Ok(LockfileStatus::Outdated)
    } else {
        Ok(LockfileStatus::Fresh)
    }
}

fn stat_if_exists<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Option<Timestamp>> {
    match fs.modified(path) {
        Ok(t) => Ok(Some(t)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "not found, skipped");
            Ok(None)
        }
        Err(source) => Err(Error::Stat {
            path: path.to_path_buf(),
            source,
        }),
    }
}
