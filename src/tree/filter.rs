//! File classification for tree walking

use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::patterns::{PatternSet, exclusion_list};

use super::utils::has_extension;

/// What a file is to a staleness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    Excluded,
    Source,
    Dist,
    Ignored,
}

/// Decides the [`FileClass`] of a path from the configured extensions and patterns.
///
/// Checks run in a fixed order and the first hit wins: extension, exclude, source, dist.
/// A path matching both source and dist patterns is therefore a source file.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    extensions: Vec<String>,
    exclude: PatternSet,
    source: PatternSet,
    dist: PatternSet,
}

impl FileClassifier {
    pub fn new(
        extensions: Vec<String>,
        exclude: PatternSet,
        source: PatternSet,
        dist: PatternSet,
    ) -> Self {
        Self {
            extensions,
            exclude,
            source,
            dist,
        }
    }

    /// Compile every pattern of `config` against `root`.
    ///
    /// The built-in test directory exclusions are merged in unless `include_tests` is set.
    pub fn from_config(root: &Path, config: &Config) -> Result<Self> {
        let exclude = exclusion_list(&config.exclude, config.include_tests);
        tracing::debug!(patterns = ?exclude, "exclusion list");
        Ok(Self::new(
            config.extensions.clone(),
            PatternSet::compile(root, &exclude)?,
            PatternSet::compile(root, &config.src)?,
            PatternSet::compile(root, &config.dist)?,
        ))
    }

    pub fn classify(&self, path: &Path) -> FileClass {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !has_extension(&name, &self.extensions) {
            FileClass::Ignored
        } else if self.exclude.is_match(path) {
            FileClass::Excluded
        } else if self.source.is_match(path) {
            FileClass::Source
        } else if self.dist.is_match(path) {
            FileClass::Dist
        } else {
            FileClass::Ignored
        }
    }
}
