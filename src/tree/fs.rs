//! Filesystem access used by the walker and the staleness evaluator

use std::ffi::OsString;
use std::io;
use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};

/// Modification time, truncated to whole milliseconds.
pub type Timestamp = DateTime<Utc>;

/// Kind of a directory entry, after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Sockets, devices, dangling symlinks and anything else that is neither.
    Other,
}

/// One entry of a directory listing.
///
/// The name is kept as the platform returned it, so joining it back onto the
/// directory always yields a path that exists, UTF-8 or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The two filesystem primitives a staleness check needs.
pub trait FileSystem: Sync {
    /// List a directory. Entry order is unspecified; callers sort.
    ///
    /// Fails if the type of any entry cannot be determined, except for dangling
    /// symlinks, which are reported as [`EntryKind::Other`].
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Modification time of a file, at millisecond precision.
    fn modified(&self, path: &Path) -> io::Result<Timestamp>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let entry_path = entry.path();
            // std::fs::metadata follows symlinks, so a link reports its target's type
            let kind = match std::fs::metadata(&entry_path) {
                Ok(meta) if meta.is_dir() => EntryKind::Dir,
                Ok(meta) if meta.is_file() => EntryKind::File,
                Ok(_) => EntryKind::Other,
                Err(e) if e.kind() == io::ErrorKind::NotFound => EntryKind::Other,
                Err(e) => {
                    return Err(io::Error::new(
                        e.kind(),
                        format!("{}: {}", entry_path.display(), e),
                    ));
                }
            };
            entries.push(DirEntry::new(entry.file_name(), kind));
        }
        Ok(entries)
    }

    fn modified(&self, path: &Path) -> io::Result<Timestamp> {
        let mtime = std::fs::metadata(path)?.modified()?;
        Ok(to_millis(DateTime::<Utc>::from(mtime)))
    }
}

/// Drop sub-millisecond precision.
pub fn to_millis(time: Timestamp) -> Timestamp {
    time.trunc_subsecs(3)
}

/// Build a timestamp from milliseconds since the Unix epoch.
pub fn from_epoch_millis(ms: i64) -> Timestamp {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
