//! Seams between the session engine and the outside world.
//!
//! The engine is UI-agnostic: answers arrive through an [`AnswerSource`],
//! the transition sound goes through a [`TransitionCue`], and everything the
//! participant should see is pushed to a [`SessionObserver`].

use async_trait::async_trait;

use crate::results::ResultRecord;
use crate::session::QuestionView;
use crate::summary::SessionSummary;

// ---------------------------------------------------------------------------
// Answer input
// ---------------------------------------------------------------------------

/// Where participant answers come from.
#[async_trait]
pub trait AnswerSource: Send {
    /// Wait for an answer to `question`.
    ///
    /// Returns `None` once the source is exhausted (e.g. stdin closed).
    /// Must be cancel-safe: the engine drops this future whenever a
    /// countdown tick completes first, then calls it again.
    async fn next_answer(&mut self, question: &QuestionView) -> Option<String>;
}

// ---------------------------------------------------------------------------
// Transition cue
// ---------------------------------------------------------------------------

/// A short cue played once per question transition.
pub trait TransitionCue: Send + Sync {
    /// Play the cue. Errors are logged by the engine and otherwise ignored.
    fn play(&self) -> anyhow::Result<()>;
}

/// A cue that does nothing.
pub struct SilentCue;

impl TransitionCue for SilentCue {
    fn play(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Receives session progress for display.
pub trait SessionObserver: Send + Sync {
    fn on_question_ready(&self, question: &QuestionView);
    fn on_countdown(&self, index: usize, remaining_secs: u32);
    fn on_result_recorded(&self, record: &ResultRecord);
    fn on_session_complete(&self, summary: &SessionSummary);
}
