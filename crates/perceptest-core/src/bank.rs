//! The question bank: the flattened, ordered question list for a session.

use std::collections::BTreeMap;

use crate::error::CorpusError;
use crate::model::{QuestionRecord, Subtype};

/// Read-only, non-empty list of questions in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Wrap a question list. An empty list cannot start a session.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, CorpusError> {
        if questions.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed bank.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.questions.iter()
    }

    /// Image shown on the intro screen: the last question's stimulus.
    pub fn example_image(&self) -> &str {
        self.questions
            .last()
            .map(|q| q.image_path.as_str())
            .unwrap_or_default()
    }

    /// Number of questions per subtype; `None` counts questions without one.
    pub fn subtype_counts(&self) -> BTreeMap<Option<Subtype>, usize> {
        let mut counts = BTreeMap::new();
        for q in &self.questions {
            *counts.entry(q.subtype()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of relational questions.
    pub fn relational_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_relational()).count()
    }
}
