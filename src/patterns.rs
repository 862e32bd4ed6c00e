//! Glob pattern compilation
//!
//! Patterns are matched against absolute path strings. A pattern starting with `.` is
//! anchored to the project root before compilation; anything else is used as written, so
//! `**/tests/**` matches at any depth while `/abs/dir/*.js` matches only that directory.
//!
//! Wildcards never match a path component that starts with `.` below the project root:
//! `./dist/**` skips `dist/.cache/`, and such names have to be spelled out, as in
//! `./dist/.cache/**` or `./src/.*.js`. Components above the root are not checked, so
//! the location of the project does not change what its patterns match.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Error, Result};

/// Directories that hold test helpers and fixtures. Excluded unless tests are included.
pub const TEST_EXCLUDE_PATTERNS: &[&str] = &[
    "**/__tests__/**/__helper__/**/*",
    "**/__tests__/**/__helpers__/**/*",
    "**/__tests__/**/__fixture__/**/*",
    "**/__tests__/**/__fixtures__/**/*",
    "**/test/**/helper/**/*",
    "**/test/**/helpers/**/*",
    "**/test/**/fixture/**/*",
    "**/test/**/fixtures/**/*",
    "**/tests/**/helper/**/*",
    "**/tests/**/helpers/**/*",
    "**/tests/**/fixture/**/*",
    "**/tests/**/fixtures/**/*",
];

/// A single compiled pattern, possibly negated with a leading `!`.
#[derive(Debug, Clone)]
struct CompiledPattern {
    matcher: GlobMatcher,
    /// Segments of the pattern that start with a literal `.`.
    dot_segments: Vec<GlobMatcher>,
    negated: bool,
}

impl CompiledPattern {
    fn is_match(&self, path: &Path, dot_names: &[&OsStr]) -> bool {
        let hit = self.matcher.is_match(path)
            && dot_names
                .iter()
                .all(|name| self.dot_segments.iter().any(|seg| seg.is_match(name)));
        hit != self.negated
    }
}

/// A set of patterns compiled into one predicate.
///
/// A path matches when any pattern in the set matches. The empty set matches nothing.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    root: PathBuf,
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compile patterns, anchoring relative ones (leading `.`) to `root`.
    ///
    /// Fails on the first malformed pattern.
    pub fn compile<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile_one(root, p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            root: root.to_path_buf(),
            patterns,
        })
    }

    /// The constant-false predicate.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_match(&self, path: &Path) -> bool {
        let dot_names = self.dot_names(path);
        self.patterns.iter().any(|p| p.is_match(path, &dot_names))
    }

    /// Components of `path` below the root whose names start with `.`.
    fn dot_names<'p>(&self, path: &'p Path) -> Vec<&'p OsStr> {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) if name.as_encoded_bytes().starts_with(b".") => {
                    Some(name)
                }
                _ => None,
            })
            .collect()
    }
}

fn compile_one(root: &Path, raw: &str) -> Result<CompiledPattern> {
    let (negated, body) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let resolved = resolve_pattern(root, body);
    let matcher = build_matcher(&resolved).map_err(|source| Error::InvalidPattern {
        pattern: raw.to_string(),
        source,
    })?;
    // A segment that does not compile on its own (an alternation spanning `/`)
    // lets no dot names through.
    let dot_segments = resolved
        .split('/')
        .filter(|seg| seg.starts_with('.') && *seg != "." && *seg != "..")
        .filter_map(|seg| build_matcher(seg).ok())
        .collect();
    Ok(CompiledPattern {
        matcher,
        dot_segments,
        negated,
    })
}

fn build_matcher(glob: &str) -> std::result::Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(glob)
        .literal_separator(true)
        .backslash_escape(true)
        .build()?
        .compile_matcher())
}

/// Anchor a root-relative pattern (one starting with `.`) to `root`.
pub fn resolve_pattern(root: &Path, pattern: &str) -> String {
    if pattern.starts_with('.') {
        normalize(&root.join(pattern)).to_string_lossy().into_owned()
    } else {
        pattern.to_string()
    }
}

/// Lexically collapse `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// The full exclusion list: built-in test directories (unless included) then user patterns.
pub fn exclusion_list(user: &[String], include_tests: bool) -> Vec<String> {
    let mut list: Vec<String> = if include_tests {
        Vec::new()
    } else {
        TEST_EXCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect()
    };
    list.extend(user.iter().cloned());
    list
}
