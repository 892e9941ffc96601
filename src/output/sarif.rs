//! SARIF (Static Analysis Results Interchange Format) output.
//!
//! The document can be uploaded to GitHub Code Scanning so compromised
//! lockfile entries show up as alerts on the lockfile.

use super::{format_ranges, Reporter};
use crate::model::Finding;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

const RULE_ID: &str = "compromised-package";

/// SARIF v2.1.0 schema root
#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
    properties: SarifRunProperties,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRunProperties {
    rules_source: String,
    count: usize,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifRuleConfiguration,
}

#[derive(Serialize)]
struct SarifRuleConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
}

/// Collects one SARIF result per finding and writes the document on
/// `summarize`.
pub struct SarifReporter<W: Write> {
    out: W,
    results: Vec<SarifResult>,
}

impl<W: Write> SarifReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            results: Vec::new(),
        }
    }
}

fn to_result(finding: &Finding) -> SarifResult {
    SarifResult {
        rule_id: RULE_ID,
        level: "error",
        message: SarifMessage {
            text: format!(
                "Compromised package {} matches {} at {}",
                finding.package_spec(),
                format_ranges(finding),
                finding.location
            ),
        },
        locations: vec![SarifLocation {
            physical_location: SarifPhysicalLocation {
                artifact_location: SarifArtifactLocation {
                    uri: finding.file.display().to_string().replace('\\', "/"),
                },
            },
            logical_locations: vec![SarifLogicalLocation {
                fully_qualified_name: finding.location.clone(),
            }],
        }],
    }
}

impl<W: Write> Reporter for SarifReporter<W> {
    fn report(&mut self, findings: &[Finding]) -> Result<()> {
        self.results.extend(findings.iter().map(to_result));
        Ok(())
    }

    fn summarize(&mut self, count: usize, source: &str) -> Result<()> {
        let report = SarifReport {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "lockguard",
                        version: env!("CARGO_PKG_VERSION"),
                        rules: vec![SarifRule {
                            id: RULE_ID,
                            name: "CompromisedPackageVersion",
                            short_description: SarifMessage {
                                text: "Lockfile pins a known-compromised package version".to_string(),
                            },
                            default_configuration: SarifRuleConfiguration { level: "error" },
                        }],
                    },
                },
                results: std::mem::take(&mut self.results),
                properties: SarifRunProperties {
                    rules_source: source.to_string(),
                    count,
                },
            }],
        };

        serde_json::to_writer_pretty(&mut self.out, &report)?;
        writeln!(self.out)?;
        Ok(())
    }
}
