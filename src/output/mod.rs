//! Report rendering.
//!
//! A [`Reporter`] receives the findings of a run followed by a summary and
//! writes them in one output format. [`write_report`] drives a reporter
//! over a finished [`ScanReport`].

mod cli;
mod github;
mod json;
mod sarif;

pub use cli::TableReporter;
pub use github::GithubReporter;
pub use json::JsonReporter;
pub use sarif::SarifReporter;

use crate::model::{Finding, ScanReport};
use anyhow::Result;
use std::io::Write;

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
    /// SARIF format for code scanning upload
    Sarif,
    /// GitHub Actions workflow commands
    Github,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            "github" | "gha" => Ok(OutputFormat::Github),
            _ => Err(format!(
                "Unknown format: {}. Use 'table', 'json', 'sarif', or 'github'",
                s
            )),
        }
    }
}

/// Receives structured findings and renders them.
///
/// `report` may be called several times; `summarize` is called once, last.
pub trait Reporter {
    fn report(&mut self, findings: &[Finding]) -> Result<()>;

    fn summarize(&mut self, count: usize, source: &str) -> Result<()>;
}

/// Returns the reporter for `format`, writing to `out`.
pub fn reporter_for<'a, W: Write + 'a>(format: OutputFormat, out: W) -> Box<dyn Reporter + 'a> {
    match format {
        OutputFormat::Table => Box::new(TableReporter::new(out)),
        OutputFormat::Json => Box::new(JsonReporter::new(out)),
        OutputFormat::Sarif => Box::new(SarifReporter::new(out)),
        OutputFormat::Github => Box::new(GithubReporter::new(out)),
    }
}

/// Renders a finished report in `format`.
///
/// ```
/// use lockguard::output::{write_report, OutputFormat};
/// use lockguard::ScanReport;
///
/// let report = ScanReport::new("rules.json");
/// let mut out = Vec::new();
/// write_report(&report, OutputFormat::Json, &mut out)?;
///
/// let doc: serde_json::Value = serde_json::from_slice(&out)?;
/// assert_eq!(doc["count"], 0);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn write_report<W: Write>(report: &ScanReport, format: OutputFormat, out: W) -> Result<()> {
    let mut reporter = reporter_for(format, out);
    reporter.report(&report.findings)?;
    reporter.summarize(report.count(), &report.rules_source)
}

/// `matched_ranges` joined for display.
pub(crate) fn format_ranges(finding: &Finding) -> String {
    finding.matched_ranges.join(" || ")
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_findings() -> Vec<Finding> {
        vec![
            Finding::new(
                "app/package-lock.json",
                "packages.@acme/bad",
                "@acme/bad",
                "1.0.2",
                vec!["1.0.*".to_string()],
            ),
            Finding::new(
                "app/package-lock.json",
                "dependencies.evil",
                "evil",
                "2.0.0",
                vec!["*".to_string(), ">=2".to_string()],
            ),
        ]
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("sarif".parse::<OutputFormat>(), Ok(OutputFormat::Sarif));
        assert_eq!("github".parse::<OutputFormat>(), Ok(OutputFormat::Github));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_ranges() {
        assert_eq!(format_ranges(&sample_findings()[1]), "* || >=2");
    }

    #[test]
    fn test_write_report_every_format() {
        let mut report = ScanReport::new("rules.json");
        report.record_file("app/package-lock.json", sample_findings());

        for format in [
            OutputFormat::Table,
            OutputFormat::Json,
            OutputFormat::Sarif,
            OutputFormat::Github,
        ] {
            let mut out = Vec::new();
            write_report(&report, format, &mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("@acme/bad"), "{format:?} output lacks finding");
        }
    }
}
