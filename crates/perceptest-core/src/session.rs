//! The session state machine.
//!
//! A [`Session`] owns all mutable state for one run through a question bank:
//! the current index, the countdown, and the accumulating results. Inbound
//! events (`answer_selected`, `tick`, `time_expired`) name the question they
//! target; anything aimed at a question that is not currently awaiting an
//! answer is ignored, so a late tick and an answer can never both record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::answers::visible_answers;
use crate::bank::QuestionBank;
use crate::clock::Clock;
use crate::error::SessionError;
use crate::model::Subtype;
use crate::results::ResultRecord;
use crate::summary::SessionSummary;

/// Default per-question time limit in seconds.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 8;

/// What the participant sees for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Zero-based question index.
    pub index: usize,
    /// Number of questions in the bank.
    pub total: usize,
    pub image_path: String,
    pub question_text: String,
    pub subtype: Option<Subtype>,
    /// Visible answers in display order.
    pub answers: Vec<String>,
    pub time_limit_secs: u32,
}

/// Where the session is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingAnswer {
        index: usize,
        shown_at: DateTime<Utc>,
        remaining_secs: u32,
    },
    Complete,
}

/// What follows a recorded result.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The next question is now awaiting an answer.
    Next(QuestionView),
    /// That was the last question.
    Complete(SessionSummary),
}

/// A recorded result plus the transition it caused.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub record: ResultRecord,
    pub advance: Advance,
}

/// Outcome of a one-second countdown tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// The tick targeted a question that is not awaiting an answer.
    Ignored,
    /// Seconds left on the countdown.
    Remaining(u32),
    /// The countdown reached zero and a timeout was recorded.
    Expired(Box<Recorded>),
}

/// One run through a question bank.
#[derive(Debug)]
pub struct Session {
    bank: Arc<QuestionBank>,
    clock: Clock,
    time_limit_secs: u32,
    state: SessionState,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    results: Vec<ResultRecord>,
    summary: Option<SessionSummary>,
}

impl Session {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self {
            bank,
            clock: Clock::System,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            state: SessionState::Idle,
            session_id: None,
            started_at: None,
            results: Vec::new(),
            summary: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Set the per-question limit. Zero is raised to one second.
    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = secs.max(1);
        self
    }

    /// Start (or restart) the session and present the first question.
    ///
    /// Resets the identifier, timestamps, index, and results. Fails while a
    /// question is still awaiting an answer.
    pub fn start(&mut self) -> Result<QuestionView, SessionError> {
        if let SessionState::AwaitingAnswer { index, .. } = self.state {
            return Err(SessionError::InProgress { index });
        }

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.started_at = Some(self.clock.now());
        self.results.clear();
        self.summary = None;

        tracing::debug!(%session_id, questions = self.bank.len(), "session started");
        Ok(self.present(0))
    }

    /// The participant chose `value` for question `index`.
    ///
    /// Returns `None` when the event is stale or the session is not running.
    pub fn answer_selected(&mut self, index: usize, value: impl Into<String>) -> Option<Recorded> {
        let shown_at = self.awaiting(index)?;
        let question = self.bank.get(index)?;
        let elapsed = (self.clock.now() - shown_at).num_milliseconds().max(0) as u64;
        let record = ResultRecord::answered(index, question, value.into(), elapsed);
        Some(self.record(record))
    }

    /// One second of the countdown for question `index` has passed.
    pub fn tick(&mut self, index: usize) -> Tick {
        let remaining = match &mut self.state {
            SessionState::AwaitingAnswer {
                index: current,
                remaining_secs,
                ..
            } if *current == index => {
                *remaining_secs = remaining_secs.saturating_sub(1);
                *remaining_secs
            }
            _ => return Tick::Ignored,
        };

        if remaining > 0 {
            return Tick::Remaining(remaining);
        }
        match self.time_expired(index) {
            Some(recorded) => Tick::Expired(Box::new(recorded)),
            None => Tick::Ignored,
        }
    }

    /// The countdown for question `index` ran out.
    pub fn time_expired(&mut self, index: usize) -> Option<Recorded> {
        self.awaiting(index)?;
        let question = self.bank.get(index)?;
        let limit_ms = u64::from(self.time_limit_secs) * 1000;
        let record = ResultRecord::timed_out(index, question, limit_ms);
        Some(self.record(record))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Index of the question awaiting an answer, if any.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            SessionState::AwaitingAnswer { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    /// The summary, once the session is complete.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Mutable access to the clock, for advancing a fixed clock.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// When `index` is the question awaiting an answer, its presentation time.
    fn awaiting(&self, index: usize) -> Option<DateTime<Utc>> {
        match self.state {
            SessionState::AwaitingAnswer {
                index: current,
                shown_at,
                ..
            } if current == index && index < self.bank.len() => Some(shown_at),
            _ => {
                tracing::debug!(index, state = ?self.state, "ignoring event for inactive question");
                None
            }
        }
    }

    fn present(&mut self, index: usize) -> QuestionView {
        self.state = SessionState::AwaitingAnswer {
            index,
            shown_at: self.clock.now(),
            remaining_secs: self.time_limit_secs,
        };

        let (image_path, question_text, subtype) = match self.bank.get(index) {
            Some(q) => (q.image_path.clone(), q.question_text.clone(), q.subtype()),
            None => (String::new(), String::new(), None),
        };

        QuestionView {
            index,
            total: self.bank.len(),
            image_path,
            question_text,
            subtype,
            answers: visible_answers(subtype)
                .into_iter()
                .map(String::from)
                .collect(),
            time_limit_secs: self.time_limit_secs,
        }
    }

    fn record(&mut self, record: ResultRecord) -> Recorded {
        let next = record.question_index + 1;
        self.results.push(record.clone());

        let advance = if next < self.bank.len() {
            Advance::Next(self.present(next))
        } else {
            Advance::Complete(self.finish())
        };

        Recorded { record, advance }
    }

    fn finish(&mut self) -> SessionSummary {
        self.state = SessionState::Complete;
        let ended_at = self.clock.now();
        let summary = SessionSummary::build(
            self.session_id.unwrap_or_else(Uuid::nil),
            self.started_at.unwrap_or(ended_at),
            ended_at,
            self.bank.len(),
            self.results.clone(),
        );
        tracing::debug!(session_id = %summary.session_id, attempted = summary.total_questions_attempted, "session complete");
        self.summary = Some(summary.clone());
        summary
    }
}
