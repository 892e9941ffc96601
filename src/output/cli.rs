use super::{format_ranges, Reporter};
use crate::model::Finding;
use anyhow::Result;
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Matched")]
    matched: String,
    #[tabled(rename = "Location")]
    location: String,
}

/// Human-readable table output.
pub struct TableReporter<W: Write> {
    out: W,
}

impl<W: Write> TableReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Reporter for TableReporter<W> {
    fn report(&mut self, findings: &[Finding]) -> Result<()> {
        if findings.is_empty() {
            return Ok(());
        }

        let rows: Vec<FindingRow> = findings
            .iter()
            .map(|f| FindingRow {
                file: truncate(&f.file.display().to_string(), 50),
                package: truncate(&f.name, 40),
                version: f.version.clone(),
                matched: truncate(&format_ranges(f), 30),
                location: truncate(&f.location, 60),
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        writeln!(self.out)?;
        writeln!(self.out, "{}", table)?;
        Ok(())
    }

    fn summarize(&mut self, count: usize, source: &str) -> Result<()> {
        writeln!(self.out)?;
        if count == 0 {
            writeln!(self.out, "No compromised packages found.")?;
        } else {
            writeln!(
                self.out,
                "Found {} compromised package version{}.",
                count,
                if count == 1 { "" } else { "s" }
            )?;
        }
        writeln!(self.out, "Rules: {}", source)?;
        Ok(())
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
