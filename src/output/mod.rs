//! Reporting of check results
//!
//! - `warnings` - one colored line per outdated file, on stderr
//! - `json` - the full report as JSON, on stdout

mod config;
mod json;
mod warnings;

pub use config::OutputConfig;
pub use json::print_json;
pub use warnings::Reporter;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::tree::from_epoch_millis;
    use crate::{CheckReport, LockfileStatus, Verdict};

    #[test]
    fn test_report_serializes_to_json() {
        let report = CheckReport {
            lockfile: Some(LockfileStatus::Skipped),
            verdict: Some(Verdict {
                outdated: true,
                offending_paths: vec![PathBuf::from("/p/dist/a.js")],
                newest_source: PathBuf::from("/p/src/a.js"),
                newest_source_time: from_epoch_millis(1_000),
                adjusted_threshold: from_epoch_millis(0),
            }),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["lockfile"], "skipped");
        assert_eq!(value["verdict"]["outdated"], true);
        assert_eq!(value["verdict"]["offending_paths"][0], "/p/dist/a.js");
        assert_eq!(
            value["verdict"]["newest_source_time"],
            "1970-01-01T00:00:01Z"
        );
    }
}
