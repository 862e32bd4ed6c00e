//! Staleness evaluation
//!
//! The newest source timestamp, minus the tolerance, is the threshold every dist file is
//! held to. A dist file strictly older than the threshold is outdated.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::tree::{FileSystem, Timestamp};

/// Outcome of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub outdated: bool,
    /// Every outdated dist file, in the order the dist files were given.
    pub offending_paths: Vec<PathBuf>,
    pub newest_source: PathBuf,
    pub newest_source_time: Timestamp,
    pub adjusted_threshold: Timestamp,
}

/// Subtract the tolerance from a timestamp, saturating at the earliest representable time.
pub fn threshold(newest: Timestamp, tolerance_ms: u64) -> Timestamp {
    let tolerance = i64::try_from(tolerance_ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds);
    tolerance
        .and_then(|t| newest.checked_sub_signed(t))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `true` when a file modified at `mtime` is older than `threshold`. Equal is up to date.
pub fn is_outdated(mtime: Timestamp, threshold: Timestamp) -> bool {
    mtime < threshold
}

/// Compares dist file timestamps against the newest source file.
pub struct StalenessEvaluator<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    tolerance_ms: u64,
    parallel_workers: usize,
}

impl<'a, F: FileSystem + ?Sized> StalenessEvaluator<'a, F> {
    pub fn new(fs: &'a F, tolerance_ms: u64) -> Self {
        Self {
            fs,
            tolerance_ms,
            parallel_workers: 1,
        }
    }

    /// Number of threads used for stat calls. 0 = rayon's default pool, 1 = sequential.
    pub fn with_parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = workers;
        self
    }

    pub fn evaluate(&self, sources: &[PathBuf], dist: &[PathBuf]) -> Result<Verdict> {
        let source_times = self.stat_all(sources)?;

        // First file wins on ties, matching visitation order
        let mut newest: Option<(&PathBuf, Timestamp)> = None;
        for (path, mtime) in sources.iter().zip(source_times) {
            trace!(path = %path.display(), modified = %mtime, "source file");
            if newest.is_none_or(|(_, best)| mtime > best) {
                newest = Some((path, mtime));
            }
        }
        let (newest_source, newest_source_time) = newest.ok_or(Error::NoSourceFiles)?;

        let adjusted_threshold = threshold(newest_source_time, self.tolerance_ms);
        debug!(
            path = %newest_source.display(),
            modified = %newest_source_time,
            threshold = %adjusted_threshold,
            "most current source file"
        );

        let dist_times = self.stat_all(dist)?;
        let offending_paths: Vec<PathBuf> = dist
            .iter()
            .zip(dist_times)
            .filter(|(path, mtime)| {
                trace!(path = %path.display(), modified = %mtime, "dist file");
                is_outdated(*mtime, adjusted_threshold)
            })
            .map(|(path, _)| path.clone())
            .collect();

        Ok(Verdict {
            outdated: !offending_paths.is_empty(),
            offending_paths,
            newest_source: newest_source.clone(),
            newest_source_time,
            adjusted_threshold,
        })
    }

    /// Stat every path, keeping input order regardless of how the work is scheduled.
    fn stat_all(&self, paths: &[PathBuf]) -> Result<Vec<Timestamp>> {
        let stat = |path: &PathBuf| stat_one(self.fs, path);

        match self.parallel_workers {
            1 => paths.iter().map(stat).collect(),
            0 => paths.par_iter().map(stat).collect(),
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| paths.par_iter().map(stat).collect()),
                Err(e) => {
                    debug!(error = %e, "could not build thread pool, using the global pool");
                    paths.par_iter().map(stat).collect()
                }
            },
        }
    }
}

fn stat_one<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Timestamp> {
    fs.modified(path).map_err(|source| Error::Stat {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryFileSystem;
    use crate::tree::from_epoch_millis;

    const T: i64 = 1_700_000_000_000;

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    fn evaluate(fs: &MemoryFileSystem, tolerance: u64) -> Verdict {
        let (sources, dist) = fs.split_by_prefix("/src/", "/dist/");
        StalenessEvaluator::new(fs, tolerance)
            .evaluate(&sources, &dist)
            .unwrap()
    }

    #[test]
    fn test_dist_newer_than_source() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T);
        fs.add_file("/dist/a.js", T + 10_000);

        let verdict = evaluate(&fs, 5000);
        assert!(!verdict.outdated);
        assert!(verdict.offending_paths.is_empty());
        assert_eq!(verdict.newest_source_time, from_epoch_millis(T));
        assert_eq!(verdict.adjusted_threshold, from_epoch_millis(T - 5000));
    }

    #[test]
    fn test_dist_one_millisecond_older_without_tolerance() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T);
        fs.add_file("/dist/a.js", T - 1);

        let verdict = evaluate(&fs, 0);
        assert!(verdict.outdated);
        assert_eq!(verdict.offending_paths, paths(&["/dist/a.js"]));
    }

    #[test]
    fn test_threshold_boundary() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T);
        fs.add_file("/dist/equal.js", T - 2000);
        fs.add_file("/dist/older.js", T - 2001);

        let verdict = evaluate(&fs, 2000);
        assert_eq!(verdict.offending_paths, paths(&["/dist/older.js"]));
    }

    #[test]
    fn test_newest_source_is_used() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/old.js", T - 60_000);
        fs.add_file("/src/new.js", T);
        fs.add_file("/dist/a.js", T - 30_000);

        let verdict = evaluate(&fs, 0);
        assert_eq!(verdict.newest_source, PathBuf::from("/src/new.js"));
        assert!(verdict.outdated);
    }

    #[test]
    fn test_every_offending_path_is_reported() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T);
        fs.add_file("/dist/a.js", T - 10_000);
        fs.add_file("/dist/b.js", T + 1);
        fs.add_file("/dist/c.js", T - 20_000);

        let verdict = evaluate(&fs, 0);
        assert_eq!(verdict.offending_paths, paths(&["/dist/a.js", "/dist/c.js"]));
    }

    #[test]
    fn test_tolerance_is_monotonic() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T);
        fs.add_file("/dist/a.js", T - 3000);
        fs.add_file("/dist/b.js", T - 7000);

        let mut previous = usize::MAX;
        for tolerance in [0, 1000, 3000, 5000, 7000, 10_000] {
            let count = evaluate(&fs, tolerance).offending_paths.len();
            assert!(count <= previous, "tolerance {} increased offenders", tolerance);
            previous = count;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_order_does_not_change_verdict() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T - 5);
        fs.add_file("/src/b.js", T);
        fs.add_file("/dist/a.js", T - 100);
        fs.add_file("/dist/b.js", T + 100);

        let sources = paths(&["/src/a.js", "/src/b.js"]);
        let dist = paths(&["/dist/a.js", "/dist/b.js"]);
        let forward = StalenessEvaluator::new(&fs, 0).evaluate(&sources, &dist).unwrap();

        let sources_rev: Vec<_> = sources.iter().rev().cloned().collect();
        let dist_rev: Vec<_> = dist.iter().rev().cloned().collect();
        let backward = StalenessEvaluator::new(&fs, 0)
            .evaluate(&sources_rev, &dist_rev)
            .unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T);
        for i in 0..50 {
            fs.add_file(&format!("/dist/{:02}.js", i), T - i * 100);
        }
        let (sources, dist) = fs.split_by_prefix("/src/", "/dist/");

        let sequential = StalenessEvaluator::new(&fs, 1000)
            .evaluate(&sources, &dist)
            .unwrap();
        for workers in [0, 4] {
            let parallel = StalenessEvaluator::new(&fs, 1000)
                .with_parallel_workers(workers)
                .evaluate(&sources, &dist)
                .unwrap();
            assert_eq!(parallel, sequential);
        }
        assert_eq!(sequential.offending_paths.len(), 39);
    }

    #[test]
    fn test_no_sources() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dist/a.js", T);
        let err = StalenessEvaluator::new(&fs, 0)
            .evaluate(&[], &paths(&["/dist/a.js"]))
            .unwrap_err();
        assert!(matches!(err, Error::NoSourceFiles));
    }

    #[test]
    fn test_missing_file_is_a_stat_error() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.js", T);
        let err = StalenessEvaluator::new(&fs, 0)
            .evaluate(&paths(&["/src/a.js"]), &paths(&["/dist/gone.js"]))
            .unwrap_err();
        assert!(matches!(err, Error::Stat { .. }));
        assert!(err.is_traversal());
    }

    #[test]
    fn test_threshold_saturates() {
        let earliest = DateTime::<Utc>::MIN_UTC;
        assert_eq!(threshold(earliest, 1), earliest);
        assert_eq!(threshold(from_epoch_millis(T), u64::MAX), earliest);
        assert_eq!(threshold(from_epoch_millis(T), 0), from_epoch_millis(T));
    }
}
