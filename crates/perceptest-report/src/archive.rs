//! Result archive packaging and the end-of-session export.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use perceptest_core::summary::SessionSummary;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::chart::{render_accuracy_chart, ChartError};

/// Name of the summary entry inside the archive.
pub const RESULTS_ENTRY: &str = "results.json";
/// Name of the chart entry inside the archive.
pub const CHART_ENTRY: &str = "accuracy_plot.png";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize results: {0}")]
    Serialize(String),

    #[error("export task failed: {0}")]
    Task(String),
}

/// How an export attempt ended. The summary is untouched in every case.
#[derive(Debug)]
pub enum ExportOutcome {
    Written(PathBuf),
    ChartFailed(ExportError),
    ArchiveFailed(ExportError),
}

impl ExportOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ExportOutcome::Written(path) => Some(path),
            _ => None,
        }
    }
}

/// Package the summary and chart into an in-memory ZIP.
pub fn build_archive(summary: &SessionSummary, chart_png: &[u8]) -> Result<Vec<u8>, ExportError> {
    let json = summary
        .to_json_pretty()
        .map_err(|e| ExportError::Serialize(format!("{e:#}")))?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(RESULTS_ENTRY, options)?;
    zip.write_all(json.as_bytes())?;

    // PNG data is already compressed.
    zip.start_file(CHART_ENTRY, options.compression_method(CompressionMethod::Stored))?;
    zip.write_all(chart_png)?;

    Ok(zip.finish()?.into_inner())
}

/// Build the archive and write it to `{dir}/{sessionId}_results.zip`.
pub fn write_archive(
    summary: &SessionSummary,
    chart_png: &[u8],
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let bytes = build_archive(summary, chart_png)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(summary.archive_file_name());
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Render the chart, then package and write the archive.
///
/// Both steps run on the blocking pool, chart first.
pub async fn export_session(summary: &SessionSummary, dir: &Path) -> ExportOutcome {
    let chart_input = summary.clone();
    let chart = tokio::task::spawn_blocking(move || render_accuracy_chart(&chart_input)).await;
    let chart_png = match chart {
        Ok(Ok(png)) => png,
        Ok(Err(e)) => {
            tracing::warn!("chart rendering failed: {e}");
            return ExportOutcome::ChartFailed(e.into());
        }
        Err(e) => {
            tracing::warn!("chart task failed: {e}");
            return ExportOutcome::ChartFailed(ExportError::Task(e.to_string()));
        }
    };

    let archive_input = summary.clone();
    let dir = dir.to_path_buf();
    let written =
        tokio::task::spawn_blocking(move || write_archive(&archive_input, &chart_png, &dir)).await;
    match written {
        Ok(Ok(path)) => {
            tracing::info!("results archive written to {}", path.display());
            ExportOutcome::Written(path)
        }
        Ok(Err(e)) => {
            tracing::warn!("archive export failed: {e}");
            ExportOutcome::ArchiveFailed(e)
        }
        Err(e) => {
            tracing::warn!("archive task failed: {e}");
            ExportOutcome::ArchiveFailed(ExportError::Task(e.to_string()))
        }
    }
}

/// Path of the plain JSON fallback written when the archive cannot be.
pub fn fallback_json_path(summary: &SessionSummary, dir: &Path) -> PathBuf {
    dir.join(format!("{}_results.json", summary.session_id))
}

/// Write the summary as plain JSON next to where the archive would go.
pub fn write_fallback_json(summary: &SessionSummary, dir: &Path) -> Result<PathBuf> {
    let path = fallback_json_path(summary, dir);
    summary.save_json(&path)?;
    Ok(path)
}

/// Read the summary back out of an archive's `results.json`.
pub fn read_archive_summary(bytes: &[u8]) -> Result<SessionSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("not a valid ZIP archive")?;
    let mut entry = archive
        .by_name(RESULTS_ENTRY)
        .with_context(|| format!("archive has no {RESULTS_ENTRY}"))?;
    let mut json = String::new();
    entry.read_to_string(&mut json)?;
    SessionSummary::from_json_str(&json)
}

/// Load a summary from either a results archive or a bare JSON file.
pub fn load_summary(path: &Path) -> Result<SessionSummary> {
    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
    if is_zip {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read archive {}", path.display()))?;
        read_archive_summary(&bytes).with_context(|| format!("in {}", path.display()))
    } else {
        SessionSummary::load_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use perceptest_core::model::{Category, QuestionRecord, QuestionVector};
    use perceptest_core::results::ResultRecord;
    use uuid::Uuid;

    fn make_summary() -> SessionSummary {
        let q = QuestionRecord {
            image_path: "images/scene_1.png".into(),
            question_text: "How many shapes are there?".into(),
            correct_answer: "3".into(),
            question_vector: QuestionVector::parse_bits("00000010001").unwrap(),
        };
        let results = vec![
            ResultRecord::answered(0, &q, "3".into(), 1500),
            ResultRecord::timed_out(1, &q, 8000),
        ];
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 10).unwrap();
        SessionSummary::build(
            Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap(),
            start,
            end,
            2,
            results,
        )
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(String::from).collect()
    }

    #[test]
    fn archive_contains_both_entries() {
        let summary = make_summary();
        let bytes = build_archive(&summary, b"\x89PNG fake").unwrap();

        let mut names = entry_names(&bytes);
        names.sort();
        assert_eq!(names, vec![CHART_ENTRY, RESULTS_ENTRY]);

        let restored = read_archive_summary(&bytes).unwrap();
        assert_eq!(restored, summary);
        assert_eq!(restored.accuracy(Category::Count), 0.5);
    }

    #[test]
    fn chart_bytes_are_stored_verbatim() {
        let bytes = build_archive(&make_summary(), b"chart-bytes").unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(CHART_ENTRY).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"chart-bytes");
    }

    #[tokio::test]
    async fn export_writes_named_archive() {
        let dir = tempfile::tempdir().unwrap();
        let summary = make_summary();

        let outcome = export_session(&summary, dir.path()).await;
        let path = outcome.path().unwrap().to_path_buf();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8_results.zip"
        );

        let loaded = load_summary(&path).unwrap();
        assert_eq!(loaded.session_id, summary.session_id);
        assert_eq!(loaded.results.len(), 2);
    }

    #[tokio::test]
    async fn chart_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut summary = make_summary();
        summary
            .accuracy_summary
            .insert(Category::Overall, f64::INFINITY);

        let outcome = export_session(&summary, dir.path()).await;
        assert!(matches!(outcome, ExportOutcome::ChartFailed(_)));
        assert!(!dir.path().join(summary.archive_file_name()).exists());
    }

    #[tokio::test]
    async fn archive_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory should be.
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, "not a directory").unwrap();

        let outcome = export_session(&make_summary(), &blocker).await;
        assert!(matches!(outcome, ExportOutcome::ArchiveFailed(_)));
    }

    #[test]
    fn fallback_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let summary = make_summary();
        let path = write_fallback_json(&summary, dir.path()).unwrap();
        assert!(path
            .to_str()
            .unwrap()
            .ends_with("67e55044-10b1-426f-9247-bb680e5fe0c8_results.json"));
        assert_eq!(load_summary(&path).unwrap(), summary);
    }

    #[test]
    fn garbage_archive_is_an_error() {
        assert!(read_archive_summary(b"definitely not a zip").is_err());
    }
}
