//! Directory tree walking and file classification
//!
//! - `FileClassifier`: tags a single path as source, dist, excluded or ignored
//! - `TreeWalker`: walks a project root and collects source and dist files
//! - `FileSystem`: the directory listing and stat primitives both of the above rely on

mod filter;
mod fs;
mod utils;
mod walker;

// Re-export public types
pub use filter::{FileClass, FileClassifier};
pub use fs::{
    DirEntry, EntryKind, FileSystem, OsFileSystem, Timestamp, from_epoch_millis, to_millis,
};
pub use utils::{PRUNED_DIRS, has_extension, should_prune_dir};
pub use walker::{FileInventory, TreeWalker};
