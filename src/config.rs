//! Configuration loading and defaulting
//!
//! The project configuration lives in `.remembrance.json` at the project root. Keys use the
//! camelCase names of the JSON file; [`ConfigFile`] mirrors that file verbatim and
//! [`ConfigFile::resolve`] applies defaults to produce an immutable [`Config`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the configuration file expected in the project root.
pub const CONFIG_FILE_NAME: &str = ".remembrance.json";

pub const DEFAULT_EXTENSIONS: &[&str] = &["cjs", "js", "map", "mjs", "ts"];

/// Default tolerance in milliseconds.
pub const DEFAULT_TOLERANCE_MS: u64 = 5000;

/// How much diagnostic output a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    #[default]
    Off,
    On,
    Verbose,
}

/// Whether `package-lock.json` is checked against `package.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageJsonMode {
    Skip,
    #[default]
    Check,
    /// Only the lockfile check runs; sources and dist files are not examined.
    Solo,
}

/// Resolved configuration for one run. Never mutated once built.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub src: Vec<String>,
    pub dist: Vec<String>,
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    pub include_tests: bool,
    pub tolerance_ms: u64,
    pub warn_only: bool,
    pub silent: bool,
    pub debug: DebugLevel,
    pub package_json: PackageJsonMode,
    /// Number of parallel workers for timestamp lookups.
    /// 0 = rayon's default pool, 1 = sequential, N = N worker threads
    pub parallel_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src: Vec::new(),
            dist: Vec::new(),
            exclude: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_tests: false,
            tolerance_ms: DEFAULT_TOLERANCE_MS,
            warn_only: false,
            silent: false,
            debug: DebugLevel::Off,
            package_json: PackageJsonMode::Check,
            parallel_workers: 0,
        }
    }
}

impl Config {
    /// Load and resolve `path`, taking the warn-only default from `NODE_ENV`.
    pub fn load(path: &Path) -> Result<Self> {
        let node_env = std::env::var("NODE_ENV").ok();
        ConfigFile::read(path)?.resolve(node_env.as_deref())
    }

    /// Load the configuration file from a project root.
    pub fn load_from_root(root: &Path) -> Result<Self> {
        Self::load(&root.join(CONFIG_FILE_NAME))
    }

    /// Check the pattern lists a staleness check needs.
    pub fn validate(&self) -> Result<()> {
        if self.package_json == PackageJsonMode::Solo {
            return Ok(());
        }
        if self.src.is_empty() {
            return Err(Error::MissingPatterns("src"));
        }
        if self.dist.is_empty() {
            return Err(Error::MissingPatterns("dist"));
        }
        Ok(())
    }
}

/// A string or a list of strings, as accepted by `src`, `dist` and `exclude`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// A boolean or a keyword string, as accepted by `debug` and `packageJSON`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Switch {
    Flag(bool),
    Keyword(String),
}

/// The configuration file as written on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub src: Option<OneOrMany>,
    pub dist: Option<OneOrMany>,
    pub exclude: Option<OneOrMany>,
    /// Anything other than an array falls back to the default extension list.
    pub extensions: Option<serde_json::Value>,
    pub include_tests: Option<bool>,
    pub tolerance: Option<u64>,
    pub warn_only: Option<bool>,
    pub silent: Option<bool>,
    pub debug: Option<Switch>,
    #[serde(rename = "packageJSON")]
    pub package_json: Option<Switch>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply defaults and validate.
    ///
    /// `node_env` is the value of `NODE_ENV`; `development` makes warn-only the default.
    pub fn resolve(self, node_env: Option<&str>) -> Result<Config> {
        let defaults = Config::default();

        let package_json = match self.package_json {
            None => PackageJsonMode::Check,
            Some(Switch::Flag(true)) => PackageJsonMode::Check,
            Some(Switch::Flag(false)) => PackageJsonMode::Skip,
            Some(Switch::Keyword(k)) if k == "solo" => PackageJsonMode::Solo,
            Some(Switch::Keyword(k)) if k.is_empty() => PackageJsonMode::Skip,
            Some(Switch::Keyword(_)) => PackageJsonMode::Check,
        };

        let debug = match self.debug {
            None | Some(Switch::Flag(false)) => DebugLevel::Off,
            Some(Switch::Keyword(k)) if k == "verbose" => DebugLevel::Verbose,
            Some(Switch::Keyword(k)) if k.is_empty() => DebugLevel::Off,
            Some(_) => DebugLevel::On,
        };

        let extensions = match self.extensions {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => defaults.extensions,
        };

        let config = Config {
            src: self.src.map(OneOrMany::into_vec).unwrap_or_default(),
            dist: self.dist.map(OneOrMany::into_vec).unwrap_or_default(),
            exclude: self.exclude.map(OneOrMany::into_vec).unwrap_or_default(),
            extensions,
            include_tests: self.include_tests.unwrap_or(false),
            tolerance_ms: self.tolerance.unwrap_or(DEFAULT_TOLERANCE_MS),
            warn_only: self
                .warn_only
                .unwrap_or_else(|| node_env == Some("development")),
            silent: self.silent.unwrap_or(false),
            debug,
            package_json,
            parallel_workers: defaults.parallel_workers,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ConfigFile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(r#"{"src": "./src/**", "dist": "./dist/**"}"#)
            .resolve(None)
            .unwrap();
        assert_eq!(config.src, vec!["./src/**"]);
        assert_eq!(config.dist, vec!["./dist/**"]);
        assert!(config.exclude.is_empty());
        assert_eq!(config.extensions, vec!["cjs", "js", "map", "mjs", "ts"]);
        assert!(!config.include_tests);
        assert_eq!(config.tolerance_ms, 5000);
        assert!(!config.warn_only);
        assert!(!config.silent);
        assert_eq!(config.debug, DebugLevel::Off);
        assert_eq!(config.package_json, PackageJsonMode::Check);
    }

    #[test]
    fn test_arrays_and_overrides() {
        let config = parse(
            r#"{
                "src": ["./src/**", "./lib/**"],
                "dist": ["./dist/**"],
                "exclude": "./src/vendor/**",
                "extensions": ["js"],
                "includeTests": true,
                "tolerance": 0,
                "warnOnly": true,
                "silent": true,
                "debug": "verbose",
                "packageJSON": false
            }"#,
        )
        .resolve(None)
        .unwrap();
        assert_eq!(config.src.len(), 2);
        assert_eq!(config.exclude, vec!["./src/vendor/**"]);
        assert_eq!(config.extensions, vec!["js"]);
        assert!(config.include_tests);
        assert_eq!(config.tolerance_ms, 0);
        assert!(config.warn_only);
        assert!(config.silent);
        assert_eq!(config.debug, DebugLevel::Verbose);
        assert_eq!(config.package_json, PackageJsonMode::Skip);
    }

    #[test]
    fn test_non_array_extensions_fall_back_to_default() {
        let config = parse(r#"{"src": "a", "dist": "b", "extensions": "js"}"#)
            .resolve(None)
            .unwrap();
        assert_eq!(config.extensions.len(), DEFAULT_EXTENSIONS.len());
    }

    #[test]
    fn test_missing_src_or_dist() {
        let err = parse(r#"{"dist": "./dist/**"}"#).resolve(None).unwrap_err();
        assert!(matches!(err, Error::MissingPatterns("src")));

        let err = parse(r#"{"src": "./src/**", "dist": []}"#)
            .resolve(None)
            .unwrap_err();
        assert!(matches!(err, Error::MissingPatterns("dist")));
    }

    #[test]
    fn test_solo_mode_needs_no_patterns() {
        let config = parse(r#"{"packageJSON": "solo"}"#).resolve(None).unwrap();
        assert_eq!(config.package_json, PackageJsonMode::Solo);
    }

    #[test]
    fn test_warn_only_defaults_from_node_env() {
        let file = parse(r#"{"src": "a", "dist": "b"}"#);
        assert!(file.clone().resolve(Some("development")).unwrap().warn_only);
        assert!(!file.clone().resolve(Some("production")).unwrap().warn_only);

        let explicit = parse(r#"{"src": "a", "dist": "b", "warnOnly": false}"#);
        assert!(!explicit.resolve(Some("development")).unwrap().warn_only);
    }

    #[test]
    fn test_debug_true() {
        let config = parse(r#"{"src": "a", "dist": "b", "debug": true}"#)
            .resolve(None)
            .unwrap();
        assert_eq!(config.debug, DebugLevel::On);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Config::load_from_root(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();
        let err = Config::load_from_root(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}
