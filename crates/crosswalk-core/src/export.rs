//! Handing the finished decision log to the outside world.
//!
//! The wire format is a JSON array of `{number, lane, decision}` objects and
//! must not change; the results page and any stored runs depend on it.

use std::path::{Path, PathBuf};

use crosswalk_types::{Choice, DecisionRecord, Lane, ReferenceSplit};
use serde::Serialize;
use tracing::info;

use crate::config::ScenarioConfig;

/// Errors that can occur while exporting results.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Writing the output failed.
    #[error("failed to write results: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Serializing the log failed.
    #[error("failed to serialize results: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Serialize a decision log to its stable JSON array form.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(records: &[DecisionRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string(records)?)
}

/// A destination for finished decision logs.
pub trait ResultsExporter: Send {
    /// Hand over the complete log of one session.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the log cannot be written.
    fn export(&mut self, records: &[DecisionRecord]) -> Result<(), ExportError>;
}

/// Writes the log to a JSON file, creating parent directories as needed.
#[derive(Debug, Clone)]
pub struct JsonFileExporter {
    path: PathBuf,
}

impl JsonFileExporter {
    /// Create an exporter writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultsExporter for JsonFileExporter {
    fn export(&mut self, records: &[DecisionRecord]) -> Result<(), ExportError> {
        let json = to_json(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        info!(
            path = %self.path.display(),
            records = records.len(),
            "Decision log exported"
        );
        Ok(())
    }
}

/// Keeps exported logs in memory. Used by tests and embedding hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryExporter {
    exports: Vec<Vec<DecisionRecord>>,
}

impl MemoryExporter {
    /// Create an empty exporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every log exported so far.
    pub fn exports(&self) -> &[Vec<DecisionRecord>] {
        &self.exports
    }

    /// Return the most recent log.
    pub fn last(&self) -> Option<&[DecisionRecord]> {
        self.exports.last().map(Vec::as_slice)
    }
}

impl ResultsExporter for MemoryExporter {
    fn export(&mut self, records: &[DecisionRecord]) -> Result<(), ExportError> {
        self.exports.push(records.to_vec());
        Ok(())
    }
}

/// One decision joined with its scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    /// 1-based encounter number.
    pub number: u32,
    /// Scenario title, if the scenario is known.
    pub title: Option<String>,
    /// Vehicle lane when the window opened.
    pub lane: Lane,
    /// The recorded choice.
    pub decision: Choice,
    /// How the reference population split, if known.
    pub reference: Option<ReferenceSplit>,
    /// Percentage of the reference population that chose the same side.
    pub reference_share: Option<f64>,
    /// Whether the choice matched the reference majority. `None` when there
    /// is no reference or it is an exact tie.
    pub sided_with_majority: Option<bool>,
}

/// The data behind a results page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsSummary {
    /// One entry per decision, in log order.
    pub entries: Vec<SummaryEntry>,
    /// Number of decisions that matched the reference majority.
    pub majority_agreements: u32,
    /// Number of decisions that had a reference majority to compare with.
    pub comparable: u32,
}

impl ResultsSummary {
    /// Join a decision log with the scenarios it was played on.
    ///
    /// Record `number` n is matched with `scenarios[n - 1]`.
    pub fn build(records: &[DecisionRecord], scenarios: &[ScenarioConfig]) -> Self {
        let mut summary = Self::default();
        for record in records {
            let scenario = record
                .number
                .checked_sub(1)
                .and_then(|idx| usize::try_from(idx).ok())
                .and_then(|idx| scenarios.get(idx));
            let reference = scenario.and_then(|s| s.reference);
            let sided_with_majority = reference
                .and_then(|split| split.majority())
                .map(|majority| majority == record.decision);

            if let Some(agreed) = sided_with_majority {
                summary.comparable = summary.comparable.saturating_add(1);
                if agreed {
                    summary.majority_agreements = summary.majority_agreements.saturating_add(1);
                }
            }
            summary.entries.push(SummaryEntry {
                number: record.number,
                title: scenario.map(|s| s.title.clone()),
                lane: record.lane,
                decision: record.decision,
                reference,
                reference_share: reference.map(|split| split.share_of(record.decision)),
                sided_with_majority,
            });
        }
        summary
    }
}
