//! Shared utility functions for tree walking

/// Directories that are never descended into.
pub const PRUNED_DIRS: &[&str] = &[".git", ".github", "node_modules"];

/// Check if a directory should be skipped entirely, by exact basename.
pub fn should_prune_dir(name: &str) -> bool {
    PRUNED_DIRS.contains(&name)
}

/// Check if a file name ends in `.<ext>` for one of the given extensions.
pub fn has_extension<S: AsRef<str>>(name: &str, extensions: &[S]) -> bool {
    extensions.iter().any(|ext| {
        name.strip_suffix(ext.as_ref())
            .is_some_and(|stem| stem.ends_with('.'))
    })
}
