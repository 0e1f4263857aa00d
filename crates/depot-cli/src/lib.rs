use std::path::Path;

use anyhow::Context;
use depot_core::models::{JobReport, JobStatus, VersionDescriptor};
use serde::{Deserialize, Serialize};

/// Descriptor files hold either a bare list or `{"versions": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorFile {
    List(Vec<VersionDescriptor>),
    Wrapped { versions: Vec<VersionDescriptor> },
}

pub fn parse_descriptors(json: &str) -> anyhow::Result<Vec<VersionDescriptor>> {
    let file: DescriptorFile =
        serde_json::from_str(json).context("Descriptor file must be a JSON list of {uri, created, label}")?;
    Ok(match file {
        DescriptorFile::List(versions) | DescriptorFile::Wrapped { versions } => versions,
    })
}

pub fn load_descriptors(path: &Path) -> anyhow::Result<Vec<VersionDescriptor>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor file {}", path.display()))?;
    parse_descriptors(&json)
}

/// Outcome counts for a batch of job executions
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub retried: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[JobReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match (report.status, report.retried) {
                (_, true) => summary.retried += 1,
                (JobStatus::Completed, _) => summary.completed += 1,
                (JobStatus::Failed, _) => summary.failed += 1,
                _ => {}
            }
        }
        summary
    }
}
