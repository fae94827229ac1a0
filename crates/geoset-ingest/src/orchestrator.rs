//! Sequential ingestion of every dataset file in a directory
//!
//! Files are processed one at a time in file name order. For each file the
//! orchestrator resolves an adapter, starts a [`RecordPipeline`] and runs the
//! [`IngestionDriver`] to completion before moving on. A file that cannot be
//! resolved or opened is reported and skipped; only an unreadable directory
//! fails the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::IngestConfig;
use crate::driver::{DriverConfig, DriverState, IngestStats, IngestionDriver};
use crate::pipeline::RecordPipeline;
use crate::registry::SourceRegistry;
use crate::source::SourceError;
use crate::store::EntityStore;
use crate::{IngestError, Result};

/// Regular files in `dir`, excluding `marker`, sorted by file name
///
/// The scan is not recursive. Entries whose metadata cannot be read are
/// skipped with a warning.
pub fn discover_files(dir: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::Discovery {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if entry.file_name().to_string_lossy() == marker {
            continue;
        }

        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => {},
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot stat entry, skipping"),
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub data_dir: PathBuf,
    pub marker_file: String,
    pub relay_capacity: usize,
    pub driver: DriverConfig,
}

impl OrchestratorSettings {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            marker_file: config.marker_file.clone(),
            relay_capacity: config.relay_capacity,
            driver: config.driver_config(),
        }
    }
}

/// What happened to one discovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum FileOutcome {
    Ingested,
    /// No adapter registered for the file name
    Skipped(String),
    /// The adapter could not be constructed or started
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file_name: String,
    /// Label of the resolved adapter
    pub adapter: Option<String>,
    pub outcome: FileOutcome,
    pub stats: IngestStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|report| predicate(&report.outcome)).count()
    }

    pub fn files_ingested(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Ingested))
    }

    pub fn files_skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Skipped(_)))
    }

    pub fn files_failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Failed(_)))
    }

    pub fn was_cancelled(&self) -> bool {
        self.count(|outcome| matches!(outcome, FileOutcome::Cancelled)) > 0
    }

    pub fn records_received(&self) -> u64 {
        self.files.iter().map(|report| report.stats.records_received).sum()
    }

    pub fn entities_flushed(&self) -> u64 {
        self.files.iter().map(|report| report.stats.entities_flushed).sum()
    }

    pub fn batches_failed(&self) -> u64 {
        self.files.iter().map(|report| report.stats.batches_failed).sum()
    }

    pub fn entities_dropped(&self) -> u64 {
        self.files.iter().map(|report| report.stats.entities_dropped).sum()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs one pipeline per discovered file, strictly in sequence
pub struct Orchestrator {
    registry: SourceRegistry,
    driver: IngestionDriver,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(registry: SourceRegistry, store: Arc<dyn EntityStore>, settings: OrchestratorSettings) -> Self {
        let driver = IngestionDriver::new(store, settings.driver);
        Self {
            registry,
            driver,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Ingest every discovered file
    ///
    /// Fails only when the data directory cannot be listed. Cancellation
    /// ends the run before the next file starts.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary> {
        let started_at = Utc::now();
        let files = discover_files(&self.settings.data_dir, &self.settings.marker_file)?;

        info!(
            dir = %self.settings.data_dir.display(),
            files = files.len(),
            "Starting ingestion run"
        );

        let mut reports = Vec::with_capacity(files.len());

        for path in &files {
            if cancel.is_cancelled() {
                info!(remaining = files.len() - reports.len(), "Run cancelled, not starting further files");
                break;
            }
            let span = info_span!("ingest_file", file = %path.display());
            reports.push(self.ingest_file(path, &cancel).instrument(span).await);
        }

        let summary = RunSummary {
            files: reports,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            ingested = summary.files_ingested(),
            skipped = summary.files_skipped(),
            failed = summary.files_failed(),
            records = summary.records_received(),
            flushed = summary.entities_flushed(),
            dropped = summary.entities_dropped(),
            elapsed_ms = summary.elapsed().num_milliseconds(),
            "Ingestion run finished"
        );

        Ok(summary)
    }

    async fn ingest_file(&self, path: &Path, cancel: &CancellationToken) -> FileReport {
        let started_at = Utc::now();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let adapter = self.registry.resolve(&file_name).map(|d| d.label.clone());

        let report = |outcome: FileOutcome, stats: IngestStats| FileReport {
            file_name: file_name.clone(),
            adapter: adapter.clone(),
            outcome,
            stats,
            started_at,
            finished_at: Utc::now(),
        };

        let source = match self.registry.open(path) {
            Ok(source) => source,
            Err(SourceError::Unsupported(name)) => {
                warn!(file = %name, "File not supported, skipping");
                return report(
                    FileOutcome::Skipped(format!("{name} file not supported")),
                    IngestStats::default(),
                );
            },
            Err(e) => {
                error!(file = %file_name, error = %e, "Failed to open source, skipping");
                return report(FileOutcome::Failed(e.to_string()), IngestStats::default());
            },
        };

        let stream = match RecordPipeline::new(source, self.settings.relay_capacity).start(cancel.clone()) {
            Ok(stream) => stream,
            Err(SourceError::Cancelled(_)) => {
                return report(FileOutcome::Cancelled, IngestStats::default());
            },
            Err(e) => {
                error!(file = %file_name, error = %e, "Failed to start source, skipping");
                return report(FileOutcome::Failed(e.to_string()), IngestStats::default());
            },
        };

        info!(file = %file_name, adapter = adapter.as_deref().unwrap_or("-"), "Ingesting file");
        let stats = self.driver.run(&file_name, stream, cancel.clone()).await;

        let outcome = match stats.state {
            DriverState::Cancelled => FileOutcome::Cancelled,
            _ => FileOutcome::Ingested,
        };
        report(outcome, stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.csv"), "").unwrap();
        std::fs::write(dir.path().join("a.csv"), "").unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.csv"), "").unwrap();

        let files = discover_files(dir.path(), ".gitignore").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["a.csv", "b.csv"]);
    }

    #[test]
    fn test_discover_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = discover_files(&dir.path().join("absent"), ".gitignore").unwrap_err();
        assert!(matches!(err, IngestError::Discovery { .. }));
    }

    #[test]
    fn test_summary_totals() {
        let now = Utc::now();
        let stats = IngestStats {
            records_received: 5,
            entities_flushed: 4,
            batches_flushed: 1,
            batches_failed: 1,
            entities_dropped: 1,
            state: DriverState::Done,
        };
        let file = |outcome| FileReport {
            file_name: "f.csv".into(),
            adapter: None,
            outcome,
            stats: stats.clone(),
            started_at: now,
            finished_at: now,
        };

        let summary = RunSummary {
            files: vec![
                file(FileOutcome::Ingested),
                file(FileOutcome::Skipped("x".into())),
                file(FileOutcome::Failed("y".into())),
            ],
            started_at: now,
            finished_at: now,
        };

        assert_eq!(summary.files_ingested(), 1);
        assert_eq!(summary.files_skipped(), 1);
        assert_eq!(summary.files_failed(), 1);
        assert!(!summary.was_cancelled());
        assert_eq!(summary.entities_flushed(), 12);
        assert_eq!(summary.entities_dropped(), 3);
    }
}
