//! Session summary: the exported artifact, with JSON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Category;
use crate::results::ResultRecord;
use crate::scoring::{accuracy_by_category, tally_results, CategoryTally};

/// Everything known about a finished session. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Random v4 session identifier.
    pub session_id: Uuid,
    pub session_start_time: DateTime<Utc>,
    pub session_end_time: DateTime<Utc>,
    /// End minus start, in milliseconds.
    pub total_time_ms: u64,
    pub total_questions_attempted: usize,
    pub total_questions_available: usize,
    /// Accuracy ratio in [0, 1] for each of the nine categories.
    pub accuracy_summary: BTreeMap<Category, f64>,
    /// Attempted/correct counts behind each accuracy.
    #[serde(default)]
    pub category_counts: BTreeMap<Category, CategoryTally>,
    /// Every result, in question order.
    pub results: Vec<ResultRecord>,
}

impl SessionSummary {
    /// Aggregate the results and assemble the summary.
    pub fn build(
        session_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        total_questions_available: usize,
        results: Vec<ResultRecord>,
    ) -> Self {
        let category_counts = tally_results(&results);
        let accuracy_summary = accuracy_by_category(&category_counts);
        let total_time_ms = (ended_at - started_at).num_milliseconds().max(0) as u64;

        Self {
            session_id,
            session_start_time: started_at,
            session_end_time: ended_at,
            total_time_ms,
            total_questions_attempted: results.len(),
            total_questions_available,
            accuracy_summary,
            category_counts,
            results,
        }
    }

    /// Accuracy for a category; 0.0 when absent.
    pub fn accuracy(&self, category: Category) -> f64 {
        self.accuracy_summary.get(&category).copied().unwrap_or(0.0)
    }

    /// Counts for a category; zero when absent.
    pub fn tally(&self, category: Category) -> CategoryTally {
        self.category_counts
            .get(&category)
            .copied()
            .unwrap_or_default()
    }

    /// File name of the exported archive.
    pub fn archive_file_name(&self) -> String {
        format!("{}_results.zip", self.session_id)
    }

    /// Pretty-printed JSON, as stored in `results.json`.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize session summary")
    }

    /// Parse a summary from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse session summary JSON")
    }

    /// Save the summary as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        Ok(())
    }

    /// Load a summary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read summary from {}", path.display()))?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fixed_clock;
    use crate::model::{QuestionRecord, QuestionVector};

    fn make_summary() -> SessionSummary {
        let question = QuestionRecord {
            image_path: "images/7.png".into(),
            question_text: "How many circles?".into(),
            correct_answer: "3".into(),
            question_vector: QuestionVector::parse_bits("00000010001").unwrap(),
        };
        let results = vec![
            ResultRecord::answered(0, &question, "3".into(), 1200),
            ResultRecord::timed_out(1, &question, 8000),
        ];
        let start = fixed_clock().now();
        let end = start + chrono::Duration::seconds(10);
        SessionSummary::build(Uuid::nil(), start, end, 2, results)
    }

    #[test]
    fn build_aggregates() {
        let summary = make_summary();
        assert_eq!(summary.total_time_ms, 10_000);
        assert_eq!(summary.total_questions_attempted, 2);
        assert_eq!(summary.accuracy_summary.len(), 9);
        assert!((summary.accuracy(Category::Count) - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.accuracy(Category::Shape), 0.0);
        assert_eq!(summary.tally(Category::Relational).attempted, 2);
        assert_eq!(
            summary.archive_file_name(),
            "00000000-0000-0000-0000-000000000000_results.zip"
        );
    }

    #[test]
    fn json_uses_exported_field_names_and_order() {
        let json = make_summary().to_json_pretty().unwrap();
        for key in [
            "sessionId",
            "sessionStartTime",
            "sessionEndTime",
            "totalTimeMs",
            "totalQuestionsAttempted",
            "totalQuestionsAvailable",
            "accuracySummary",
            "results",
        ] {
            assert!(json.contains(&format!("\"{key}\"")), "missing {key}");
        }
        let shape = json.find("\"shape\"").unwrap();
        let overall = json.find("\"overall\"").unwrap();
        assert!(shape < overall);
    }

    #[test]
    fn json_roundtrip() {
        let summary = make_summary();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");

        summary.save_json(&path).unwrap();
        let loaded = SessionSummary::load_json(&path).unwrap();

        assert_eq!(loaded, summary);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SessionSummary::load_json(&dir.path().join("nope.json")).is_err());
    }
}
