//! Remembrance - check that build artifacts are not older than their sources
//!
//! A run walks a project root, classifies files as source or dist by glob pattern, then
//! checks that no dist file predates the newest source file by more than a tolerance.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod package_lock;
pub mod patterns;
pub mod staleness;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::path::Path;

use serde::Serialize;
use tracing::debug;

pub use config::{Config, ConfigFile, DebugLevel, PackageJsonMode};
pub use error::{Error, Result};
pub use output::{OutputConfig, Reporter, print_json};
pub use package_lock::{LockfileStatus, check_lockfile};
pub use patterns::PatternSet;
pub use staleness::{StalenessEvaluator, Verdict};
pub use tree::{FileClass, FileClassifier, FileInventory, FileSystem, OsFileSystem, TreeWalker};

/// Walk `root` and decide whether any dist file is outdated.
pub fn run_staleness_check(root: &Path, config: &Config) -> Result<Verdict> {
    run_staleness_check_with(&OsFileSystem, root, config)
}

/// [`run_staleness_check`] over any [`FileSystem`].
pub fn run_staleness_check_with<F: FileSystem + ?Sized>(
    fs: &F,
    root: &Path,
    config: &Config,
) -> Result<Verdict> {
    if config.src.is_empty() {
        return Err(Error::MissingPatterns("src"));
    }
    if config.dist.is_empty() {
        return Err(Error::MissingPatterns("dist"));
    }

    // Every pattern is compiled before the first directory is listed
    let classifier = FileClassifier::from_config(root, config)?;

    debug!(root = %root.display(), "collecting files");
    let inventory = TreeWalker::new(fs, &classifier).walk(root)?;
    debug!(
        sources = ?inventory.sources,
        dist = ?inventory.dist,
        "file collections"
    );

    StalenessEvaluator::new(fs, config.tolerance_ms)
        .with_parallel_workers(config.parallel_workers)
        .evaluate(&inventory.sources, &inventory.dist)
}

/// Everything a full run found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// `None` when the lockfile check is disabled.
    pub lockfile: Option<LockfileStatus>,
    /// `None` in solo mode, or when an outdated lockfile stopped the run.
    pub verdict: Option<Verdict>,
}

impl CheckReport {
    /// `true` when anything was found outdated.
    pub fn outdated(&self) -> bool {
        self.lockfile == Some(LockfileStatus::Outdated)
            || self.verdict.as_ref().is_some_and(|v| v.outdated)
    }

    /// `true` when the run should exit successfully.
    pub fn passed(&self, warn_only: bool) -> bool {
        warn_only || !self.outdated()
    }
}

/// Run the lockfile check (unless disabled) and the staleness check (unless in solo mode).
///
/// An outdated lockfile ends the run early unless warn-only mode is on.
pub fn run_check(root: &Path, config: &Config) -> Result<CheckReport> {
    run_check_with(&OsFileSystem, root, config)
}

pub fn run_check_with<F: FileSystem + ?Sized>(
    fs: &F,
    root: &Path,
    config: &Config,
) -> Result<CheckReport> {
    run_check_with_hook(fs, root, config, |_| {})
}

/// [`run_check_with`], calling `on_lockfile` as soon as the lockfile status is known.
///
/// The hook runs before the tree is walked, so a caller can report the lockfile even
/// when the staleness check then fails.
pub fn run_check_with_hook<F, H>(
    fs: &F,
    root: &Path,
    config: &Config,
    on_lockfile: H,
) -> Result<CheckReport>
where
    F: FileSystem + ?Sized,
    H: FnOnce(LockfileStatus),
{
    config.validate()?;

    let lockfile = match config.package_json {
        PackageJsonMode::Skip => None,
        PackageJsonMode::Check | PackageJsonMode::Solo => {
            debug!("testing if 'package-lock.json' is up to date");
            let status = check_lockfile(fs, root, config.tolerance_ms)?;
            on_lockfile(status);
            Some(status)
        }
    };

    let stop_early = lockfile == Some(LockfileStatus::Outdated) && !config.warn_only;
    let verdict = if config.package_json == PackageJsonMode::Solo || stop_early {
        None
    } else {
        Some(run_staleness_check_with(fs, root, config)?)
    };

    Ok(CheckReport { lockfile, verdict })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryFileSystem;

    const T: i64 = 1_700_000_000_000;

    fn config(src: &str, dist: &str) -> Config {
        Config {
            src: vec![src.to_string()],
            dist: vec![dist.to_string()],
            tolerance_ms: 0,
            ..Default::default()
        }
    }

    fn project() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.add_file("/p/src/index.js", T);
        fs.add_file("/p/dist/index.js", T + 10);
        fs.add_file("/p/package.json", T);
        fs.add_file("/p/package-lock.json", T + 10);
        fs
    }

    #[test]
    fn test_up_to_date_project() {
        let fs = project();
        let report = run_check_with(&fs, Path::new("/p"), &config("./src/**", "./dist/**")).unwrap();
        assert_eq!(report.lockfile, Some(LockfileStatus::Fresh));
        assert!(!report.outdated());
        assert!(report.passed(false));
    }

    #[test]
    fn test_outdated_lockfile_stops_early() {
        let fs = project();
        fs.add_file("/p/package-lock.json", T - 1);
        let report = run_check_with(&fs, Path::new("/p"), &config("./src/**", "./dist/**")).unwrap();
        assert_eq!(report.lockfile, Some(LockfileStatus::Outdated));
        assert!(report.verdict.is_none());
        assert!(!report.passed(false));
    }

    #[test]
    fn test_outdated_lockfile_continues_in_warn_only_mode() {
        let fs = project();
        fs.add_file("/p/package-lock.json", T - 1);
        let config = Config {
            warn_only: true,
            ..config("./src/**", "./dist/**")
        };
        let report = run_check_with(&fs, Path::new("/p"), &config).unwrap();
        assert!(report.verdict.is_some());
        assert!(report.outdated());
        assert!(report.passed(true));
    }

    #[test]
    fn test_lockfile_status_is_known_before_a_failing_walk() {
        let fs = project();
        fs.add_file("/p/package-lock.json", T - 1);
        let config = Config {
            warn_only: true,
            ..config("./lib/**", "./dist/**")
        };
        let mut seen = None;
        let err = run_check_with_hook(&fs, Path::new("/p"), &config, |status| seen = Some(status))
            .unwrap_err();
        assert!(matches!(err, Error::NoSourceFiles));
        assert_eq!(seen, Some(LockfileStatus::Outdated));
    }

    #[test]
    fn test_solo_mode_skips_staleness() {
        let fs = project();
        let config = Config {
            package_json: PackageJsonMode::Solo,
            ..Default::default()
        };
        let report = run_check_with(&fs, Path::new("/p"), &config).unwrap();
        assert_eq!(report.lockfile, Some(LockfileStatus::Fresh));
        assert!(report.verdict.is_none());
    }

    #[test]
    fn test_lockfile_check_disabled() {
        let fs = project();
        fs.add_file("/p/package-lock.json", T - 100_000);
        let config = Config {
            package_json: PackageJsonMode::Skip,
            ..config("./src/**", "./dist/**")
        };
        let report = run_check_with(&fs, Path::new("/p"), &config).unwrap();
        assert_eq!(report.lockfile, None);
        assert!(!report.outdated());
    }

    #[test]
    fn test_missing_patterns() {
        let fs = project();
        let err = run_staleness_check_with(&fs, Path::new("/p"), &Config::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_bad_pattern_fails_before_walk() {
        let fs = project();
        // The root listing would fail, so only a compile error can surface
        fs.deny("/p");
        let err = run_staleness_check_with(&fs, Path::new("/p"), &config("./src/[", "./dist/**"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_runs_are_idempotent() {
        let fs = project();
        fs.add_file("/p/dist/old.js", T - 50);
        let config = config("./src/**", "./dist/**");
        let first = run_staleness_check_with(&fs, Path::new("/p"), &config).unwrap();
        let second = run_staleness_check_with(&fs, Path::new("/p"), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.offending_paths, vec![std::path::PathBuf::from("/p/dist/old.js")]);
    }
}
