//! TreeWalker - collects source and dist files under a project root

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::filter::{FileClass, FileClassifier};
use super::fs::{EntryKind, FileSystem};
use super::utils::should_prune_dir;

/// Source and dist files found by a walk, in visitation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInventory {
    pub sources: Vec<PathBuf>,
    pub dist: Vec<PathBuf>,
}

impl FileInventory {
    /// Fail if either list is empty. An empty inventory almost always means the
    /// patterns are wrong, not that the project is empty.
    pub fn ensure_complete(self) -> Result<Self> {
        if self.sources.is_empty() {
            return Err(Error::NoSourceFiles);
        }
        if self.dist.is_empty() {
            return Err(Error::NoDistFiles);
        }
        Ok(self)
    }
}

/// Depth-first, pre-order walker.
///
/// Entries of each directory are visited in file name order and a subdirectory is fully
/// walked before its next sibling, so the output order is reproducible. The walk uses an
/// explicit stack; deep trees do not grow the call stack.
pub struct TreeWalker<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    classifier: &'a FileClassifier,
}

impl<'a, F: FileSystem + ?Sized> TreeWalker<'a, F> {
    pub fn new(fs: &'a F, classifier: &'a FileClassifier) -> Self {
        Self { fs, classifier }
    }

    /// Walk `root` and fail if no source or no dist file was found.
    pub fn walk(&self, root: &Path) -> Result<FileInventory> {
        self.collect(root)?.ensure_complete()
    }

    /// Walk `root` and return whatever was found, even if empty.
    pub fn collect(&self, root: &Path) -> Result<FileInventory> {
        let mut inventory = FileInventory::default();
        let mut stack: Vec<(PathBuf, EntryKind)> = Vec::new();
        self.push_children(root, &mut stack)?;

        while let Some((path, kind)) = stack.pop() {
            match kind {
                EntryKind::Dir => self.push_children(&path, &mut stack)?,
                EntryKind::File => match self.classifier.classify(&path) {
                    FileClass::Source => {
                        debug!(path = %path.display(), "found source file");
                        inventory.sources.push(path);
                    }
                    FileClass::Dist => {
                        debug!(path = %path.display(), "found dist file");
                        inventory.dist.push(path);
                    }
                    FileClass::Excluded => {
                        trace!(path = %path.display(), "excluded");
                    }
                    FileClass::Ignored => {
                        trace!(path = %path.display(), "no match, skipped");
                    }
                },
                EntryKind::Other => {
                    trace!(path = %path.display(), "not a file or directory, skipped");
                }
            }
        }

        Ok(inventory)
    }

    /// List `dir` and push its entries so that the first by name is popped first.
    fn push_children(&self, dir: &Path, stack: &mut Vec<(PathBuf, EntryKind)>) -> Result<()> {
        let mut entries = self.fs.read_dir(dir).map_err(|source| Error::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        trace!(
            dir = %dir.display(),
            entries = ?entries.iter().map(|e| e.name.to_string_lossy()).collect::<Vec<_>>(),
            "entering directory"
        );

        for entry in entries.into_iter().rev() {
            if entry.kind == EntryKind::Dir && entry.name.to_str().is_some_and(should_prune_dir) {
                trace!(dir = %dir.join(&entry.name).display(), "pruned");
                continue;
            }
            stack.push((dir.join(&entry.name), entry.kind));
        }
        Ok(())
    }
}
