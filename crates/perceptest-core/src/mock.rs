//! Scripted collaborators for driving the engine without a terminal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::results::ResultRecord;
use crate::session::QuestionView;
use crate::summary::SessionSummary;
use crate::traits::{AnswerSource, SessionObserver, TransitionCue};

/// Answers keyed by question index.
///
/// Questions without a scripted answer never receive one, so they time out.
/// Lookups do not consume the script, which keeps `next_answer` cancel-safe.
#[derive(Debug, Default)]
pub struct ScriptedAnswers {
    answers: HashMap<usize, String>,
    closed: bool,
}

impl ScriptedAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer question `index` with `value` as soon as it is shown.
    pub fn answer(mut self, index: usize, value: impl Into<String>) -> Self {
        self.answers.insert(index, value.into());
        self
    }

    /// Report the source as exhausted instead of waiting on unscripted questions.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }
}

#[async_trait]
impl AnswerSource for ScriptedAnswers {
    async fn next_answer(&mut self, question: &QuestionView) -> Option<String> {
        match self.answers.get(&question.index) {
            Some(answer) => Some(answer.clone()),
            None if self.closed => None,
            None => std::future::pending().await,
        }
    }
}

/// Events seen by a [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    QuestionReady(usize),
    Countdown(usize, u32),
    Recorded(usize),
    Complete(usize),
}

/// Observer that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: ObservedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl SessionObserver for RecordingObserver {
    fn on_question_ready(&self, question: &QuestionView) {
        self.push(ObservedEvent::QuestionReady(question.index));
    }

    fn on_countdown(&self, index: usize, remaining_secs: u32) {
        self.push(ObservedEvent::Countdown(index, remaining_secs));
    }

    fn on_result_recorded(&self, record: &ResultRecord) {
        self.push(ObservedEvent::Recorded(record.question_index));
    }

    fn on_session_complete(&self, summary: &SessionSummary) {
        self.push(ObservedEvent::Complete(summary.results.len()));
    }
}

/// Cue that counts plays and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingCue {
    plays: AtomicU32,
    fail: bool,
}

impl CountingCue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cue whose every play fails.
    pub fn failing() -> Self {
        Self {
            plays: AtomicU32::new(0),
            fail: true,
        }
    }

    pub fn plays(&self) -> u32 {
        self.plays.load(Ordering::Relaxed)
    }
}

impl TransitionCue for CountingCue {
    fn play(&self) -> anyhow::Result<()> {
        self.plays.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            anyhow::bail!("audio device unavailable");
        }
        Ok(())
    }
}
