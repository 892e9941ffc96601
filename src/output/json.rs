use super::Reporter;
use crate::model::Finding;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDocument<'a> {
    rules_source: &'a str,
    count: usize,
    findings: &'a [Finding],
}

/// Writes one pretty-printed JSON document once the run is summarized.
pub struct JsonReporter<W: Write> {
    out: W,
    findings: Vec<Finding>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            findings: Vec::new(),
        }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, findings: &[Finding]) -> Result<()> {
        self.findings.extend_from_slice(findings);
        Ok(())
    }

    fn summarize(&mut self, count: usize, source: &str) -> Result<()> {
        let document = JsonDocument {
            rules_source: source,
            count,
            findings: &self.findings,
        };
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_findings;
    use serde_json::Value;

    #[test]
    fn test_json_document() {
        let mut out = Vec::new();
        let mut reporter = JsonReporter::new(&mut out);
        let findings = sample_findings();
        reporter.report(&findings[..1]).unwrap();
        reporter.report(&findings[1..]).unwrap();
        reporter.summarize(2, "https://example.com/feed.json").unwrap();

        let doc: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["rulesSource"], "https://example.com/feed.json");
        assert_eq!(doc["count"], 2);
        assert_eq!(doc["findings"][0]["name"], "@acme/bad");
        assert_eq!(doc["findings"][1]["matchedRanges"][1], ">=2");
        assert_eq!(doc["findings"][0]["file"], "app/package-lock.json");
    }
}
