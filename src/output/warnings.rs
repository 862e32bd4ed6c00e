//! Console warnings for outdated files

use std::io::{self, Write};
use std::path::Path;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::package_lock::{LockfileStatus, PACKAGE_LOCK};
use crate::{CheckReport, Verdict};

use super::config::OutputConfig;

/// Writes one warning line per outdated file.
pub struct Reporter {
    config: OutputConfig,
}

impl Reporter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Print the lockfile warning, if any, to stderr.
    pub fn print_lockfile(&self, status: LockfileStatus) -> io::Result<()> {
        self.write_lockfile(&mut self.stderr(), status)
    }

    /// Print one warning per outdated dist file to stderr.
    pub fn print_verdict(&self, verdict: &Verdict) -> io::Result<()> {
        self.write_verdict(&mut self.stderr(), verdict)
    }

    fn stderr(&self) -> StandardStream {
        let choice = if self.config.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        StandardStream::stderr(choice)
    }

    /// Write every warning of a finished report, lockfile first.
    pub fn write_report<W: WriteColor>(&self, out: &mut W, report: &CheckReport) -> io::Result<()> {
        if let Some(status) = report.lockfile {
            self.write_lockfile(out, status)?;
        }
        if let Some(verdict) = &report.verdict {
            self.write_verdict(out, verdict)?;
        }
        Ok(())
    }

    pub fn write_lockfile<W: WriteColor>(
        &self,
        out: &mut W,
        status: LockfileStatus,
    ) -> io::Result<()> {
        if status == LockfileStatus::Outdated {
            self.write_warning(out, Path::new(PACKAGE_LOCK))?;
        }
        Ok(())
    }

    pub fn write_verdict<W: WriteColor>(&self, out: &mut W, verdict: &Verdict) -> io::Result<()> {
        for path in &verdict.offending_paths {
            self.write_warning(out, path)?;
        }
        Ok(())
    }

    fn write_warning<W: WriteColor>(&self, out: &mut W, path: &Path) -> io::Result<()> {
        if self.config.silent {
            return Ok(());
        }
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(out, "  ==> ")?;
        out.reset()?;
        writeln!(out, "'{}' is not up to date", path.display())
    }
}
