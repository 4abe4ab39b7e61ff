//! Session orchestrator.
//!
//! One [`PlacementEngine`] owns one student's test run: it interleaves
//! selection, answer checking, and adjustment in strict order, ends after the
//! configured question count (or early when the bank runs dry), and emits
//! exactly one placement report. Engines share the bank read-only; everything
//! else is session-local, so independent sessions can run concurrently and a
//! dropped engine is a cancelled session.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument, warn};

use crate::adjustment;
use crate::advisor::{self, AdvisorRequest, PlacementAdvisor};
use crate::answers::{self, AnswerInput};
use crate::bank::QuestionBank;
use crate::config::EngineConfig;
use crate::domain::{AnsweredRecord, EngineError, ServedQuestion};
use crate::scoring::{build_fallback_report, PlacementReport};
use crate::selection;
use crate::session::{SessionState, TestPhase};

pub struct PlacementEngine {
    bank: Arc<QuestionBank>,
    config: EngineConfig,
    state: SessionState,
    rng: StdRng,
    advisor: Option<Arc<dyn PlacementAdvisor>>,
    outstanding: Option<ServedQuestion>,
    ended_early: bool,
}

impl PlacementEngine {
    pub fn new(bank: Arc<QuestionBank>, config: EngineConfig) -> Self {
        Self::with_rng(bank, config, StdRng::from_entropy())
    }

    /// Deterministic engine for tests and replayable sessions.
    pub fn with_seed(bank: Arc<QuestionBank>, config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(bank, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bank: Arc<QuestionBank>, config: EngineConfig, rng: StdRng) -> Self {
        let state = SessionState::new(&config);
        Self {
            bank,
            config,
            state,
            rng,
            advisor: None,
            outstanding: None,
            ended_early: false,
        }
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn PlacementAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True once the question target is reached or the bank ran dry.
    pub fn is_complete(&self) -> bool {
        self.ended_early || self.state.phase() == TestPhase::Complete
    }

    /// True when the bank ran out before the question target.
    pub fn ended_early(&self) -> bool {
        self.ended_early
    }

    /// Serve the next question, or `Ok(None)` when the test is over.
    ///
    /// Every served question must be answered before the next may be drawn.
    #[instrument(skip(self), fields(q_index = self.state.q_index))]
    pub fn next_question(&mut self) -> Result<Option<ServedQuestion>, EngineError> {
        if let Some(served) = &self.outstanding {
            return Err(EngineError::QuestionOutstanding(served.question.id.clone()));
        }
        if self.is_complete() {
            return Ok(None);
        }

        match selection::select_next(&mut self.state, &self.bank, &self.config, &mut self.rng) {
            Some(served) => {
                self.outstanding = Some(served.clone());
                Ok(Some(served))
            }
            None => {
                warn!(
                    answered = self.state.q_index,
                    "question pool exhausted; ending test early"
                );
                self.ended_early = true;
                Ok(None)
            }
        }
    }

    /// Record the renderer's answer to the outstanding question and run the
    /// adjustment policy. `response_time` is seconds from render to answer.
    #[instrument(skip(self, answer))]
    pub fn submit_answer(
        &mut self,
        question_id: &str,
        answer: &AnswerInput,
        response_time: f64,
    ) -> Result<AnsweredRecord, EngineError> {
        let served = self
            .outstanding
            .take()
            .ok_or(EngineError::NoOutstandingQuestion)?;
        if served.question.id != question_id {
            let expected = served.question.id.clone();
            self.outstanding = Some(served);
            return Err(EngineError::UnexpectedQuestion {
                expected,
                got: question_id.to_string(),
            });
        }

        let checked = answers::check_answer(&served.question, answer);
        if let Some(note) = &checked.anomaly {
            warn!(question = %served.question.id, note = %note, "answer shape anomaly");
        }

        let record = AnsweredRecord {
            question_id: served.question.id.clone(),
            mechanic: served.question.mechanic(),
            assigned_level: served.assigned_level,
            skill: served.question.skill,
            correct: checked.correct,
            response_time,
            anomaly: checked.anomaly,
        };

        adjustment::update(&mut self.state, record.clone(), &self.config);
        debug!(
            question = %record.question_id,
            correct = record.correct,
            level = %self.state.current_level,
            momentum = self.state.momentum,
            "answer recorded"
        );
        Ok(record)
    }

    /// Synthesize the final report. The rule-based fallback is always built;
    /// a wired-in advisor may replace it when enabled and healthy.
    pub async fn finish(&self) -> Result<PlacementReport, EngineError> {
        if !self.is_complete() {
            return Err(EngineError::SessionIncomplete {
                answered: self.state.q_index,
                expected: self.config.questions_per_test,
            });
        }

        let fallback = build_fallback_report(&self.state, &self.config, self.ended_early);
        match &self.advisor {
            Some(advisor) if self.config.advisor_enabled => {
                let request = AdvisorRequest::from_state(&self.state);
                Ok(advisor::resolve_report(
                    advisor.as_ref(),
                    &request,
                    fallback,
                    self.config.advisor_timeout_seconds,
                )
                .await)
            }
            _ => Ok(fallback),
        }
    }
}
