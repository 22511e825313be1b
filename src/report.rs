use std::{collections::BTreeMap, fmt::Write as _, path::Path};

use anyhow::Context as _;
use serde::Serialize;

use crate::sink::{
    artifact::{separator, Artifact, Status},
    fs::{write_atomic, ITEMS_DIR},
};

pub const JSON_REPORT: &str = "report.json";
pub const TEXT_REPORT: &str = "report.txt";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportEntry {
    pub status: Status,
    pub artifact: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of every artifact in a sink, keyed by item identifier.
#[derive(Debug, Serialize)]
pub struct Report {
    pub succeeded: usize,
    pub failed: usize,
    pub items: BTreeMap<String, ReportEntry>,
}

impl Report {
    pub fn new(artifacts: &[Artifact]) -> Self {
        let items = artifacts
            .iter()
            .map(|artifact| {
                let entry = ReportEntry {
                    status: artifact.status,
                    artifact: artifact
                        .path
                        .file_name()
                        .map(|name| format!("{ITEMS_DIR}/{}", name.to_string_lossy()))
                        .unwrap_or_default(),
                    source: artifact.source.clone(),
                    error: artifact.error.clone(),
                };
                (artifact.id.clone(), entry)
            })
            .collect::<BTreeMap<_, _>>();
        let succeeded = items.values().filter(|entry| entry.status == Status::Success).count();

        Self {
            succeeded,
            failed: items.len() - succeeded,
            items,
        }
    }

    pub fn render_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "{}\nRUN REPORT\n{}\n", separator(), separator());
        let _ = writeln!(text, "Total items: {}", self.items.len());
        let _ = writeln!(text, "Succeeded: {}", self.succeeded);
        let _ = writeln!(text, "Failed: {}\n", self.failed);

        for (id, entry) in &self.items {
            match entry.status {
                Status::Success => {
                    let _ = writeln!(text, "[ok]     {id}\n         {}", entry.artifact);
                },
                Status::Failed => {
                    let _ = writeln!(text, "[failed] {id}\n         {}", entry.error.as_deref().unwrap_or("unknown error"));
                },
            }
        }

        text
    }

    /// Writes `report.json` and `report.txt` into `output`.
    pub async fn write(&self, output: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(&output.join(JSON_REPORT), json.as_bytes())
            .await
            .with_context(|| format!("failed to write {JSON_REPORT}"))?;
        write_atomic(&output.join(TEXT_REPORT), self.render_text().as_bytes())
            .await
            .with_context(|| format!("failed to write {TEXT_REPORT}"))?;

        Ok(())
    }
}
