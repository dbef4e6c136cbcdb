//! Session engine: drives one session in real time.
//!
//! Presents each question, runs a one-second countdown beside the answer
//! source, plays the transition cue, and reports progress to an observer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::bank::QuestionBank;
use crate::clock::Clock;
use crate::session::{
    Advance, QuestionView, Recorded, Session, Tick, DEFAULT_TIME_LIMIT_SECS,
};
use crate::summary::SessionSummary;
use crate::traits::{AnswerSource, SessionObserver, TransitionCue};

/// Configuration for the session engine.
#[derive(Debug, Clone)]
pub struct SessionEngineConfig {
    /// Seconds allowed per question.
    pub time_limit_secs: u32,
    /// Countdown granularity.
    pub tick_period: Duration,
}

impl Default for SessionEngineConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            tick_period: Duration::from_secs(1),
        }
    }
}

/// Runs sessions against an answer source.
pub struct SessionEngine {
    config: SessionEngineConfig,
    clock: Clock,
}

impl SessionEngine {
    pub fn new(config: SessionEngineConfig) -> Self {
        Self {
            config,
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run one full session over `bank` and return its summary.
    pub async fn run(
        &self,
        bank: Arc<QuestionBank>,
        answers: &mut dyn AnswerSource,
        observer: &dyn SessionObserver,
        cue: &dyn TransitionCue,
    ) -> Result<SessionSummary> {
        let mut session = Session::new(bank)
            .with_clock(self.clock)
            .with_time_limit(self.config.time_limit_secs);
        let mut view = session.start()?;
        let mut input_open = true;

        tracing::info!(
            "session {} started: {} questions, {}s limit",
            session.session_id().unwrap_or_default(),
            view.total,
            session.time_limit_secs()
        );

        loop {
            observer.on_question_ready(&view);
            let recorded = self
                .await_response(&mut session, &view, answers, observer, &mut input_open)
                .await?;

            observer.on_result_recorded(&recorded.record);
            if let Err(e) = cue.play() {
                tracing::warn!("transition cue failed: {e:#}");
            }

            match recorded.advance {
                Advance::Next(next) => view = next,
                Advance::Complete(summary) => {
                    tracing::info!(
                        "session {} complete: {}/{} questions in {}ms",
                        summary.session_id,
                        summary.total_questions_attempted,
                        summary.total_questions_available,
                        summary.total_time_ms
                    );
                    observer.on_session_complete(&summary);
                    return Ok(summary);
                }
            }
        }
    }

    /// Wait for an answer or the countdown, whichever comes first.
    ///
    /// The interval lives only as long as this call, so at most one countdown
    /// is ever active.
    async fn await_response(
        &self,
        session: &mut Session,
        view: &QuestionView,
        answers: &mut dyn AnswerSource,
        observer: &dyn SessionObserver,
        input_open: &mut bool,
    ) -> Result<Recorded> {
        let period = self.config.tick_period;
        let mut countdown = interval_at(Instant::now() + period, period);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = countdown.tick() => {
                    match session.tick(view.index) {
                        Tick::Remaining(secs) => observer.on_countdown(view.index, secs),
                        Tick::Expired(recorded) => {
                            observer.on_countdown(view.index, 0);
                            tracing::debug!("question {} timed out", view.index);
                            return Ok(*recorded);
                        }
                        Tick::Ignored => anyhow::bail!(
                            "countdown tick for question {} was not accepted",
                            view.index
                        ),
                    }
                }
                answer = answers.next_answer(view), if *input_open => {
                    match answer {
                        Some(value) => {
                            if let Some(recorded) = session.answer_selected(view.index, value) {
                                return Ok(recorded);
                            }
                        }
                        None => {
                            tracing::info!("answer input closed; remaining questions will time out");
                            *input_open = false;
                        }
                    }
                }
            }
        }
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new(SessionEngineConfig::default())
    }
}
