//! GitHub Actions workflow commands.
//!
//! Each finding becomes an `::error` annotation on its lockfile, wrapped in
//! a collapsible group, followed by a one-line summary annotation.

use super::{format_ranges, Reporter};
use crate::model::Finding;
use anyhow::Result;
use std::io::Write;

const GROUP_TITLE: &str = "lockguard findings";

pub struct GithubReporter<W: Write> {
    out: W,
    group_open: bool,
}

impl<W: Write> GithubReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            group_open: false,
        }
    }
}

impl<W: Write> Reporter for GithubReporter<W> {
    fn report(&mut self, findings: &[Finding]) -> Result<()> {
        if findings.is_empty() {
            return Ok(());
        }
        if !self.group_open {
            writeln!(self.out, "::group::{}", GROUP_TITLE)?;
            self.group_open = true;
        }

        for finding in findings {
            writeln!(
                self.out,
                "::error file={},title={}::{}",
                escape_property(&finding.file.display().to_string()),
                escape_property(&format!("Compromised package {}", finding.name)),
                escape_data(&format!(
                    "{} matches {} at {}",
                    finding.package_spec(),
                    format_ranges(finding),
                    finding.location
                )),
            )?;
        }
        Ok(())
    }

    fn summarize(&mut self, count: usize, source: &str) -> Result<()> {
        if self.group_open {
            writeln!(self.out, "::endgroup::")?;
            self.group_open = false;
        }

        if count == 0 {
            writeln!(
                self.out,
                "::notice title=lockguard::{}",
                escape_data(&format!("No compromised packages found (rules: {})", source))
            )?;
        } else {
            writeln!(
                self.out,
                "::error title=Compromised dependencies::{}",
                escape_data(&format!(
                    "{} compromised package version{} found (rules: {})",
                    count,
                    if count == 1 { "" } else { "s" },
                    source
                ))
            )?;
        }
        Ok(())
    }
}

/// Escapes a workflow command message.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escapes a workflow command property value.
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
