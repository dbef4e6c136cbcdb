//! Per-question result records.

use serde::{Deserialize, Serialize};

use crate::model::{QuestionRecord, QuestionVector, Subtype};

/// Outcome of one presented question. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Position of the question in the bank.
    pub question_index: usize,
    pub image_path: String,
    /// Question text as shown.
    pub question: String,
    pub question_vector: QuestionVector,
    /// Subtype derived from the vector, if any.
    pub subtype: Option<Subtype>,
    /// The chosen answer; `None` when the question timed out.
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    /// Milliseconds between presentation and answer (or the full limit).
    pub time_taken_ms: u64,
    pub timed_out: bool,
}

impl ResultRecord {
    /// Record an answer. Correctness is case-sensitive string equality.
    pub fn answered(
        index: usize,
        question: &QuestionRecord,
        answer: String,
        time_taken_ms: u64,
    ) -> Self {
        let is_correct = answer == question.correct_answer;
        Self::build(index, question, Some(answer), is_correct, time_taken_ms, false)
    }

    /// Record a timeout. Never correct.
    pub fn timed_out(index: usize, question: &QuestionRecord, time_taken_ms: u64) -> Self {
        Self::build(index, question, None, false, time_taken_ms, true)
    }

    fn build(
        index: usize,
        question: &QuestionRecord,
        user_answer: Option<String>,
        is_correct: bool,
        time_taken_ms: u64,
        timed_out: bool,
    ) -> Self {
        Self {
            question_index: index,
            image_path: question.image_path.clone(),
            question: question.question_text.clone(),
            question_vector: question.question_vector.clone(),
            subtype: question.subtype(),
            user_answer,
            correct_answer: question.correct_answer.clone(),
            is_correct,
            time_taken_ms,
            timed_out,
        }
    }

    pub fn is_relational(&self) -> bool {
        self.question_vector.is_relational()
    }
}
