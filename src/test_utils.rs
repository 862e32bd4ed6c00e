//! Test utilities for building projects on disk and in memory.
//!
//! This module is only compiled for tests and benchmarks.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use filetime::FileTime;
use tempfile::TempDir;

use crate::config::CONFIG_FILE_NAME;
use crate::tree::{DirEntry, EntryKind, FileSystem, Timestamp, from_epoch_millis};

/// A temporary project directory for testing.
///
/// Provides methods for creating files with chosen modification times and for writing
/// the configuration file. The directory is automatically cleaned up when dropped.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create a new empty temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self { dir }
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a file. Creates parent directories as needed.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Add a file and set its modification time, in milliseconds since the epoch.
    pub fn add_file_at(&self, path: &str, mtime_ms: i64) -> PathBuf {
        let full_path = self.add_file(path, "");
        self.set_mtime(path, mtime_ms);
        full_path
    }

    /// Set the modification time of an existing file.
    pub fn set_mtime(&self, path: &str, mtime_ms: i64) {
        let secs = mtime_ms.div_euclid(1000);
        let nanos = (mtime_ms.rem_euclid(1000) * 1_000_000) as u32;
        filetime::set_file_mtime(
            self.dir.path().join(path),
            FileTime::from_unix_time(secs, nanos),
        )
        .expect("Failed to set mtime");
    }

    /// Write `.remembrance.json` with the given JSON body.
    pub fn write_config(&self, json: &str) -> PathBuf {
        self.add_file(CONFIG_FILE_NAME, json)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Dir,
    File(i64),
    Other,
}

/// In-memory [`FileSystem`] with explicit millisecond timestamps.
///
/// Parent directories are created implicitly. Paths passed to [`deny`](Self::deny) fail
/// every operation with `PermissionDenied`. Paths passed to
/// [`deny_stat`](Self::deny_stat) make listing their parent fail, like a directory
/// that is readable but not searchable.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
    denied: Mutex<HashSet<PathBuf>>,
    unstatable: Mutex<HashSet<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, mtime_ms: i64) {
        self.insert(Path::new(path), Node::File(mtime_ms));
    }

    /// Add an entry that is neither a file nor a directory.
    pub fn add_other(&self, path: &str) {
        self.insert(Path::new(path), Node::Other);
    }

    pub fn remove(&self, path: &str) {
        self.nodes.lock().unwrap().remove(Path::new(path));
    }

    pub fn deny(&self, path: &str) {
        self.denied.lock().unwrap().insert(PathBuf::from(path));
    }

    pub fn deny_stat(&self, path: &str) {
        self.unstatable.lock().unwrap().insert(PathBuf::from(path));
    }

    /// All files, sorted, split into those under `source_prefix` and `dist_prefix`.
    pub fn split_by_prefix(
        &self,
        source_prefix: &str,
        dist_prefix: &str,
    ) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let nodes = self.nodes.lock().unwrap();
        let files: Vec<&PathBuf> = nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path)
            .collect();
        let under = |prefix: &str| {
            files
                .iter()
                .filter(|p| p.to_string_lossy().starts_with(prefix))
                .map(|p| (*p).clone())
                .collect::<Vec<_>>()
        };
        (under(source_prefix), under(dist_prefix))
    }

    fn insert(&self, path: &Path, node: Node) {
        let mut nodes = self.nodes.lock().unwrap();
        for ancestor in path.ancestors().skip(1) {
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
        nodes.insert(path.to_path_buf(), node);
    }

    fn check_access(&self, path: &Path) -> io::Result<()> {
        if self.denied.lock().unwrap().contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        Ok(())
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.check_access(path)?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(_) => return Err(io::Error::other("not a directory")),
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
        }
        let unstatable = self.unstatable.lock().unwrap();
        let children: Vec<(&PathBuf, &Node)> = nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .collect();
        if let Some((child, _)) = children.iter().find(|(c, _)| unstatable.contains(*c)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{}: permission denied", child.display()),
            ));
        }
        Ok(children
            .into_iter()
            .map(|(child, node)| {
                let name = child.file_name().map(OsStr::to_os_string).unwrap_or_default();
                let kind = match node {
                    Node::Dir => EntryKind::Dir,
                    Node::File(_) => EntryKind::File,
                    Node::Other => EntryKind::Other,
                };
                DirEntry::new(name, kind)
            })
            .collect())
    }

    fn modified(&self, path: &Path) -> io::Result<Timestamp> {
        self.check_access(path)?;
        match self.nodes.lock().unwrap().get(path) {
            Some(Node::File(ms)) => Ok(from_epoch_millis(*ms)),
            Some(_) => Err(io::Error::other("not a file")),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}
