//! CLI entry point for remembrance

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use remembrance::config::CONFIG_FILE_NAME;
use remembrance::logging::init_logging;
use remembrance::patterns::normalize;
use remembrance::{
    Config, DebugLevel, Error, OsFileSystem, OutputConfig, Reporter, print_json, run_check_with_hook,
};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            // Warnings go to stderr
            std::io::stderr().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "remembrance")]
#[command(about = "Check that build artifacts are not older than their sources")]
#[command(version)]
struct Args {
    /// Project root containing the config file
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Config file to use instead of <PATH>/.remembrance.json
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report outdated files but exit successfully
    #[arg(short = 'w', long = "warn-only")]
    warn_only: bool,

    /// Do not print warnings about outdated files
    #[arg(short = 's', long = "silent")]
    silent: bool,

    /// Print debug information
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Print verbose debug information (every directory and file)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Do not exclude test helper and fixture directories
    #[arg(long = "include-tests")]
    include_tests: bool,

    /// Tolerance subtracted from the newest source time.
    /// Plain numbers are milliseconds; durations like 2s or 500ms are also accepted
    #[arg(short = 't', long = "tolerance", value_name = "DURATION")]
    tolerance: Option<String>,

    /// Number of parallel workers for timestamp lookups
    /// (0 = auto-detect, 1 = sequential, N = use N workers)
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,

    /// Print the result as JSON on stdout
    #[arg(long = "json")]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,
}

/// Parse a tolerance: a bare integer is milliseconds, anything else a humantime duration.
fn parse_tolerance(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().map_err(|e| format!("{}", e));
    }
    let duration = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    u64::try_from(duration.as_millis()).map_err(|_| "tolerance too large".to_string())
}

/// Apply command-line overrides on top of the config file.
fn apply_overrides(mut config: Config, args: &Args) -> Result<Config, String> {
    if args.warn_only {
        config.warn_only = true;
    }
    if args.silent {
        config.silent = true;
    }
    if args.include_tests {
        config.include_tests = true;
    }
    if args.verbose {
        config.debug = DebugLevel::Verbose;
    } else if args.debug && config.debug == DebugLevel::Off {
        config.debug = DebugLevel::On;
    }
    if let Some(ref tolerance) = args.tolerance {
        config.tolerance_ms = parse_tolerance(tolerance)
            .map_err(|e| format!("invalid --tolerance '{}': {}", tolerance, e))?;
    }
    if let Some(jobs) = args.jobs {
        config.parallel_workers = jobs;
    }
    Ok(config)
}

fn main() {
    let args = Args::parse();

    let root = if args.path.is_absolute() {
        normalize(&args.path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        normalize(&cwd.join(&args.path))
    };

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(Error::ConfigRead { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound && args.config.is_none() =>
        {
            eprintln!(
                "remembrance: could not find config file '{}' in the project root",
                CONFIG_FILE_NAME
            );
            process::exit(1);
        }
        Err(e) => {
            eprintln!("remembrance: {}", e);
            process::exit(1);
        }
    };

    let config = apply_overrides(config, &args).unwrap_or_else(|e| {
        eprintln!("remembrance: {}", e);
        process::exit(1);
    });

    init_logging(config.debug);
    if let Ok(json) = serde_json::to_string_pretty(&config) {
        tracing::debug!("config settings {}", json);
    }

    let reporter = Reporter::new(OutputConfig {
        use_color: should_use_color(args.color),
        silent: config.silent,
    });

    // Printed before the walk, which may still fail
    let mut lockfile_printed = Ok(());
    let result = run_check_with_hook(&OsFileSystem, &root, &config, |status| {
        lockfile_printed = reporter.print_lockfile(status);
    });
    let report = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("remembrance: {}", e);
            process::exit(1);
        }
    };

    let printed = lockfile_printed
        .and_then(|_| match &report.verdict {
            Some(verdict) => reporter.print_verdict(verdict),
            None => Ok(()),
        })
        .and_then(|_| {
            if args.json {
                print_json(&report)
            } else {
                Ok(())
            }
        });
    if let Err(e) = printed {
        eprintln!("remembrance: error writing output: {}", e);
        process::exit(1);
    }

    if !report.outdated() {
        tracing::debug!("finished tests without errors");
    } else if report.passed(config.warn_only) {
        tracing::debug!("found outdated files, ignored in warn-only mode");
    } else {
        tracing::debug!("finished tests, but found errors");
        process::exit(1);
    }
}
