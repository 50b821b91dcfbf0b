//! Report renderers for audit results.
//!
//! - [`junit`]: JUnit XML, one test case per package, for CI dashboards.
//! - [`csv`]: flat `name,license,homepage,repository` listing.
//! - [`summary`]: table of failed packages for the terminal.
//!
//! JSON output is the serialized [`AuditReport`].

pub mod csv;
pub mod junit;
pub mod summary;

use crate::error::{AuditError, Result};
use crate::types::AuditReport;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

pub use self::csv::render_csv;
pub use self::junit::render_junit;
pub use self::summary::render_summary;

/// Output path meaning "write to standard output"
pub const STDOUT_OUTPUT: &str = "-";

/// Machine-readable report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Junit,
    Csv,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "junit" | "xml" => Ok(ReportFormat::Junit),
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render `report` in the given format
pub fn render(report: &AuditReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Junit => render_junit(&report.results),
        ReportFormat::Csv => Ok(render_csv(&report.results)),
        ReportFormat::Json => render_json(report),
    }
}

pub fn render_json(report: &AuditReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write rendered report content to a file, or to stdout for `-`
pub fn write_report(content: &str, output: &Path) -> Result<()> {
    if output.as_os_str() == STDOUT_OUTPUT {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", content.trim_end())?;
        return Ok(());
    }
    std::fs::write(output, content)
        .map_err(|e| AuditError::report(format!("{}: {}", output.display(), e)))
}
