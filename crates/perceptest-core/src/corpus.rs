//! Corpus loaders.
//!
//! Two interchangeable formats feed the same normalized question list:
//! a JSON object keyed by image file name, and a tab-delimited table.
//! Invalid entries are skipped with a warning; only a corpus that cannot be
//! read or parsed at all is an error.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bank::QuestionBank;
use crate::error::CorpusError;
use crate::model::{QuestionRecord, QuestionVector};

/// Default directory prefixed to image names in JSON corpora.
pub const DEFAULT_IMAGE_DIR: &str = "images/";

/// Supported corpus encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusFormat {
    Json,
    Tsv,
}

impl CorpusFormat {
    /// Guess the format from a file extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(CorpusFormat::Json),
            "tsv" | "txt" => Some(CorpusFormat::Tsv),
            _ => None,
        }
    }
}

impl fmt::Display for CorpusFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusFormat::Json => write!(f, "json"),
            CorpusFormat::Tsv => write!(f, "tsv"),
        }
    }
}

impl FromStr for CorpusFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(CorpusFormat::Json),
            "tsv" | "txt" | "delimited" => Ok(CorpusFormat::Tsv),
            other => Err(format!("unknown corpus format: {other}")),
        }
    }
}

/// An entry that was dropped during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Where the entry was found (e.g. `line 4` or `scene_12.png[1]`).
    pub location: String,
    pub reason: CorpusError,
}

/// Result of loading a corpus: valid questions plus what was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedCorpus {
    pub questions: Vec<QuestionRecord>,
    pub skipped: Vec<SkippedEntry>,
}

impl LoadedCorpus {
    fn skip(&mut self, location: String, reason: CorpusError) {
        tracing::warn!("skipping {location}: {reason}");
        self.skipped.push(SkippedEntry { location, reason });
    }

    fn accept(&mut self, location: &str, question: QuestionRecord) {
        if question.question_vector.subtype_bit_count() > 1 {
            tracing::warn!(
                "{location}: more than one subtype bit set in {}, lowest index wins",
                question.question_vector
            );
        }
        self.questions.push(question);
    }

    /// Turn the valid questions into a bank. Fails when none remain.
    pub fn into_bank(self) -> Result<QuestionBank, CorpusError> {
        QuestionBank::new(self.questions)
    }
}

/// A source format for question corpora.
pub trait CorpusLoader: Send + Sync {
    /// Short format name (e.g. "json").
    fn name(&self) -> &str;

    /// Parse corpus text. `source` is only used in messages.
    fn parse_str(&self, content: &str, source: &Path) -> Result<LoadedCorpus>;

    /// Read and parse a corpus file.
    fn load(&self, path: &Path) -> Result<LoadedCorpus> {
        let content = std::fs::read_to_string(path)
            .with_context(|| {
                format!("failed to read {} corpus file: {}", self.name(), path.display())
            })?;
        self.parse_str(&content, path)
    }
}

/// JSON corpus: `{ "<image>": [ {question, answer, question_vector}, ... ] }`.
#[derive(Debug, Clone)]
pub struct JsonCorpusLoader {
    image_dir: String,
}

impl JsonCorpusLoader {
    pub fn new(image_dir: impl Into<String>) -> Self {
        Self {
            image_dir: image_dir.into(),
        }
    }

    fn image_path(&self, name: &str) -> String {
        if self.image_dir.is_empty() || self.image_dir.ends_with('/') {
            format!("{}{name}", self.image_dir)
        } else {
            format!("{}/{name}", self.image_dir)
        }
    }

    fn parse_entry(&self, image: &str, entry: &Value) -> Result<QuestionRecord, CorpusError> {
        let obj = entry
            .as_object()
            .ok_or_else(|| CorpusError::Malformed("entry is not an object".into()))?;

        let question_text = obj
            .get("question")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(CorpusError::MissingField("question"))?;

        let correct_answer = match obj.get("answer") {
            None | Some(Value::Null) => return Err(CorpusError::MissingField("answer")),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => number_answer(n),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => return Err(CorpusError::InvalidAnswer(other.to_string())),
        };

        let raw_vector = obj
            .get("question_vector")
            .and_then(Value::as_array)
            .ok_or(CorpusError::MissingField("question_vector"))?;
        let ints = raw_vector
            .iter()
            .enumerate()
            .map(|(index, v)| {
                v.as_i64().ok_or_else(|| {
                    CorpusError::Malformed(format!("vector element {index} is not an integer: {v}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let question_vector = QuestionVector::from_ints(&ints)?;

        Ok(QuestionRecord {
            image_path: self.image_path(image),
            question_text: question_text.to_string(),
            correct_answer,
            question_vector,
        })
    }
}

/// Whole-number floats (`3.0`) normalize to integer form, matching how
/// count answers are written.
fn number_answer(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if !n.is_i64() && !n.is_u64() && f.is_finite() && f.fract() == 0.0 => {
            format!("{f:.0}")
        }
        _ => n.to_string(),
    }
}

impl Default for JsonCorpusLoader {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_DIR)
    }
}

impl CorpusLoader for JsonCorpusLoader {
    fn name(&self) -> &str {
        "json"
    }

    fn parse_str(&self, content: &str, source: &Path) -> Result<LoadedCorpus> {
        let root: serde_json::Map<String, Value> = serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON corpus: {}", source.display()))?;
        anyhow::ensure!(!root.is_empty(), "corpus file is empty: {}", source.display());

        let mut loaded = LoadedCorpus::default();
        for (image, items) in &root {
            let Some(items) = items.as_array() else {
                loaded.skip(
                    image.clone(),
                    CorpusError::Malformed("expected a list of questions".into()),
                );
                continue;
            };
            for (i, item) in items.iter().enumerate() {
                let location = format!("{image}[{i}]");
                match self.parse_entry(image, item) {
                    Ok(question) => loaded.accept(&location, question),
                    Err(reason) => loaded.skip(location, reason),
                }
            }
        }

        tracing::info!(
            "loaded {} questions from {} ({} skipped)",
            loaded.questions.len(),
            source.display(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }
}

/// Tab-delimited corpus: `imagePath \t questionText \t correctAnswer \t vectorBits`.
#[derive(Debug, Clone, Default)]
pub struct DelimitedCorpusLoader;

/// Number of fields on each delimited line.
const DELIMITED_FIELDS: usize = 4;

impl DelimitedCorpusLoader {
    fn parse_line(line: &str) -> Result<QuestionRecord, CorpusError> {
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() != DELIMITED_FIELDS {
            return Err(CorpusError::FieldCount {
                expected: DELIMITED_FIELDS,
                found: fields.len(),
            });
        }

        let required = |value: &str, name: &'static str| {
            if value.is_empty() {
                Err(CorpusError::MissingField(name))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(QuestionRecord {
            image_path: required(fields[0], "imagePath")?,
            question_text: required(fields[1], "questionText")?,
            correct_answer: required(fields[2], "correctAnswer")?,
            question_vector: QuestionVector::parse_bits(fields[3])?,
        })
    }
}

impl CorpusLoader for DelimitedCorpusLoader {
    fn name(&self) -> &str {
        "tsv"
    }

    fn parse_str(&self, content: &str, source: &Path) -> Result<LoadedCorpus> {
        let mut loaded = LoadedCorpus::default();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let location = format!("line {}", i + 1);
            match Self::parse_line(line) {
                Ok(question) => loaded.accept(&location, question),
                Err(reason) => loaded.skip(location, reason),
            }
        }

        tracing::info!(
            "loaded {} questions from {} ({} skipped)",
            loaded.questions.len(),
            source.display(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }
}

/// Create the loader for a format.
pub fn loader_for(format: CorpusFormat, image_dir: &str) -> Box<dyn CorpusLoader> {
    match format {
        CorpusFormat::Json => Box::new(JsonCorpusLoader::new(image_dir)),
        CorpusFormat::Tsv => Box::new(DelimitedCorpusLoader),
    }
}

/// Load a corpus file, detecting the format from the extension if not given.
pub fn load_corpus(
    path: &Path,
    format: Option<CorpusFormat>,
    image_dir: &str,
) -> Result<LoadedCorpus> {
    let format = match format.or_else(|| CorpusFormat::detect(path)) {
        Some(f) => f,
        None => anyhow::bail!(
            "cannot detect corpus format of {}; pass --format json|tsv",
            path.display()
        ),
    };
    loader_for(format, image_dir).load(path)
}

/// Load a corpus and build a question bank from it.
pub fn load_bank(
    path: &Path,
    format: Option<CorpusFormat>,
    image_dir: &str,
) -> Result<(QuestionBank, Vec<SkippedEntry>)> {
    let loaded = load_corpus(path, format, image_dir)?;
    let skipped = loaded.skipped.clone();
    let bank = loaded
        .into_bank()
        .with_context(|| format!("no usable questions in {}", path.display()))?;
    Ok((bank, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Subtype;
    use std::path::PathBuf;

    const VALID_JSON: &str = r#"{
        "scene_2.png": [
            {"question": "Is the green shape at the top or bottom?", "answer": "top",
             "question_vector": [0,0,0,0,0,0,0,0,1,0,0,0]},
            {"question": "How many shapes are circles?", "answer": 3,
             "question_vector": [0,0,0,0,0,0,1,0,0,0,1]}
        ],
        "scene_1.png": [
            {"question": "What colour is closest to the red square?", "answer": "blue",
             "question_vector": [0,0,0,0,0,0,1,0,1,0,0]}
        ]
    }"#;

    fn src() -> PathBuf {
        PathBuf::from("test.json")
    }

    #[test]
    fn parse_json_preserves_file_order() {
        let loaded = JsonCorpusLoader::default()
            .parse_str(VALID_JSON, &src())
            .unwrap();
        assert!(loaded.skipped.is_empty());
        let images: Vec<&str> = loaded
            .questions
            .iter()
            .map(|q| q.image_path.as_str())
            .collect();
        assert_eq!(
            images,
            vec!["images/scene_2.png", "images/scene_2.png", "images/scene_1.png"]
        );
        assert_eq!(loaded.questions[1].correct_answer, "3");
        assert_eq!(loaded.questions[1].subtype(), Some(Subtype::Count));
        assert_eq!(loaded.questions[2].subtype(), Some(Subtype::Closest));
    }

    #[test]
    fn json_image_dir_join() {
        let loader = JsonCorpusLoader::new("stimuli");
        let loaded = loader.parse_str(VALID_JSON, &src()).unwrap();
        assert_eq!(loaded.questions[0].image_path, "stimuli/scene_2.png");

        let loader = JsonCorpusLoader::new("");
        let loaded = loader.parse_str(VALID_JSON, &src()).unwrap();
        assert_eq!(loaded.questions[0].image_path, "scene_2.png");
    }

    #[test]
    fn json_invalid_entries_are_skipped() {
        let json = r#"{
            "a.png": [
                {"question": "ok", "answer": "left", "question_vector": [0,0,0,0,0,0,0,0,0,1,0]},
                {"question": "short", "answer": "left", "question_vector": [0,1]},
                {"question": "", "answer": "left", "question_vector": [0,0,0,0,0,0,0,0,0,1,0]},
                {"question": "no answer", "question_vector": [0,0,0,0,0,0,0,0,0,1,0]},
                {"question": "bad bit", "answer": "x", "question_vector": [0,0,0,0,0,0,0,0,0,7,0]}
            ],
            "b.png": {"not": "a list"}
        }"#;
        let loaded = JsonCorpusLoader::default().parse_str(json, &src()).unwrap();
        assert_eq!(loaded.questions.len(), 1);
        assert_eq!(loaded.skipped.len(), 5);
        assert_eq!(loaded.skipped[0].location, "a.png[1]");
        assert!(matches!(
            loaded.skipped[0].reason,
            CorpusError::VectorTooShort { .. }
        ));
        assert_eq!(
            loaded.skipped[1].reason,
            CorpusError::MissingField("question")
        );
        assert_eq!(loaded.skipped[2].reason, CorpusError::MissingField("answer"));
        assert!(matches!(
            loaded.skipped[3].reason,
            CorpusError::InvalidBit { index: 9, value: 7 }
        ));
        assert_eq!(loaded.skipped[4].location, "b.png");
    }

    #[test]
    fn json_empty_or_malformed_is_fatal() {
        let loader = JsonCorpusLoader::default();
        assert!(loader.parse_str("{}", &src()).is_err());
        assert!(loader.parse_str("[1, 2]", &src()).is_err());
        assert!(loader.parse_str("not json {", &src()).is_err());
    }

    #[test]
    fn whole_number_float_answers_normalize() {
        let json = r#"{
            "scene.png": [
                {"question": "How many?", "answer": 3.0,
                 "question_vector": [0,0,0,0,0,0,1,0,0,0,1]},
                {"question": "How many?", "answer": 2.5,
                 "question_vector": [0,0,0,0,0,0,1,0,0,0,1]},
                {"question": "How many?", "answer": -4,
                 "question_vector": [0,0,0,0,0,0,1,0,0,0,1]}
            ]
        }"#;
        let loaded = JsonCorpusLoader::default().parse_str(json, &src()).unwrap();
        let answers: Vec<&str> = loaded
            .questions
            .iter()
            .map(|q| q.correct_answer.as_str())
            .collect();
        assert_eq!(answers, vec!["3", "2.5", "-4"]);
    }

    #[test]
    fn parse_delimited() {
        let tsv = "img/1.png\tIs the square left or right?\tleft\t00000000010\r\n\
                   \n\
                   img/2.png\tHow many?\t5\t00000010001\n";
        let loaded = DelimitedCorpusLoader
            .parse_str(tsv, &PathBuf::from("q.tsv"))
            .unwrap();
        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.questions.len(), 2);
        assert_eq!(loaded.questions[0].image_path, "img/1.png");
        assert_eq!(loaded.questions[0].subtype(), Some(Subtype::LeftRight));
        assert_eq!(loaded.questions[1].correct_answer, "5");
    }

    #[test]
    fn delimited_bad_lines_are_skipped() {
        let tsv = "imagePath\tquestionText\tcorrectAnswer\tvector\n\
                   img/1.png\tonly three\tfields\n\
                   img/2.png\tok\ttop\t00000000100\n\
                   img/3.png\tshort\ttop\t0101\n";
        let loaded = DelimitedCorpusLoader
            .parse_str(tsv, &PathBuf::from("q.tsv"))
            .unwrap();
        assert_eq!(loaded.questions.len(), 1);
        assert_eq!(loaded.skipped.len(), 3);
        assert_eq!(loaded.skipped[0].location, "line 1");
        assert!(matches!(
            loaded.skipped[0].reason,
            CorpusError::InvalidBitChar { .. }
        ));
        assert_eq!(
            loaded.skipped[1].reason,
            CorpusError::FieldCount {
                expected: 4,
                found: 3
            }
        );
        assert!(matches!(
            loaded.skipped[2].reason,
            CorpusError::VectorTooShort { len: 4, .. }
        ));
    }

    #[test]
    fn all_invalid_means_no_bank() {
        let loaded = DelimitedCorpusLoader
            .parse_str("bad line\n", &PathBuf::from("q.tsv"))
            .unwrap();
        assert_eq!(loaded.into_bank(), Err(CorpusError::Empty));
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            CorpusFormat::detect(Path::new("descr.json")),
            Some(CorpusFormat::Json)
        );
        assert_eq!(
            CorpusFormat::detect(Path::new("questions.TSV")),
            Some(CorpusFormat::Tsv)
        );
        assert_eq!(CorpusFormat::detect(Path::new("questions")), None);
        assert_eq!("txt".parse::<CorpusFormat>().unwrap(), CorpusFormat::Tsv);
        assert!("csv".parse::<CorpusFormat>().is_err());
        assert_eq!(loader_for(CorpusFormat::Json, "").name(), "json");
        assert_eq!(loader_for(CorpusFormat::Tsv, "").name(), "tsv");
    }

    #[test]
    fn load_bank_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("descr.json");
        std::fs::write(&path, VALID_JSON).unwrap();

        let (bank, skipped) = load_bank(&path, None, DEFAULT_IMAGE_DIR).unwrap();
        assert_eq!(bank.len(), 3);
        assert!(skipped.is_empty());

        let unknown = dir.path().join("descr.dat");
        std::fs::write(&unknown, VALID_JSON).unwrap();
        assert!(load_bank(&unknown, None, DEFAULT_IMAGE_DIR).is_err());
        assert!(load_bank(&unknown, Some(CorpusFormat::Json), DEFAULT_IMAGE_DIR).is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_corpus(Path::new("/nonexistent/descr.json"), None, "")
            .unwrap_err()
            .to_string();
        assert!(err.contains("failed to read json corpus file"), "{err}");
    }
}
