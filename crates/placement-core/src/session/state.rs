//! Per-session mutable state.
//!
//! One [`SessionState`] is owned exclusively by one logical test session.
//! The bounded containers (performance window, mechanic ring) enforce their
//! caps at the container boundary so policy code can never overgrow them.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::domain::{AnsweredRecord, BalanceSide, Mechanic, NovakidLevel};

// ============================================================================
// PERFORMANCE WINDOW
// ============================================================================

/// Bounded ring of the most recent correctness outcomes, oldest evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceWindow {
    cap: usize,
    outcomes: VecDeque<bool>,
}

impl PerformanceWindow {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            outcomes: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, correct: bool) {
        if self.outcomes.len() == self.cap {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(correct);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Accuracy over the last `n` outcomes, or `None` when empty.
    pub fn accuracy_over_last(&self, n: usize) -> Option<f64> {
        let take = n.min(self.outcomes.len());
        if take == 0 {
            return None;
        }
        let correct = self
            .outcomes
            .iter()
            .rev()
            .take(take)
            .filter(|&&c| c)
            .count();
        Some(correct as f64 / take as f64)
    }

    /// Incorrect answers among the last `n` outcomes.
    pub fn incorrect_in_last(&self, n: usize) -> usize {
        self.outcomes.iter().rev().take(n).filter(|&&c| !c).count()
    }
}

// ============================================================================
// MECHANIC HISTORY RING
// ============================================================================

/// Bounded ring of recently served mechanics, consulted by the recency gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MechanicRing {
    cap: usize,
    items: VecDeque<Mechanic>,
}

impl MechanicRing {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            items: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, mechanic: Mechanic) {
        if self.items.len() == self.cap {
            self.items.pop_front();
        }
        self.items.push_back(mechanic);
    }

    pub fn contains(&self, mechanic: Mechanic) -> bool {
        self.items.contains(&mechanic)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// CATEGORY TALLY
// ============================================================================

/// Running count of served questions per balance side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryTally {
    pub audio: u32,
    pub text: u32,
}

impl CategoryTally {
    pub fn record(&mut self, side: BalanceSide) {
        match side {
            BalanceSide::Audio => self.audio += 1,
            BalanceSide::Text => self.text += 1,
        }
    }

    /// Signed imbalance: positive when audio leads.
    pub fn imbalance(&self) -> i64 {
        self.audio as i64 - self.text as i64
    }

    /// The side that has been served less, or `None` when even.
    pub fn under_represented(&self) -> Option<BalanceSide> {
        match self.imbalance() {
            0 => None,
            d if d > 0 => Some(BalanceSide::Text),
            _ => Some(BalanceSide::Audio),
        }
    }

    /// The side that must be served next once the imbalance reaches
    /// `margin`, if any.
    pub fn forced_side(&self, margin: u32) -> Option<BalanceSide> {
        if self.imbalance().unsigned_abs() >= margin as u64 {
            self.under_represented()
        } else {
            None
        }
    }
}

// ============================================================================
// TEST PHASE
// ============================================================================

/// Session phase, driven solely by the number of questions answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestPhase {
    Calibrating,
    Adaptive,
    Complete,
}

// ============================================================================
// SESSION STATE
// ============================================================================

/// All mutable state for one student's test run.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current estimated level, initialized to 1.
    pub current_level: NovakidLevel,
    /// Bounded performance-tendency scalar; positive means warming up.
    pub momentum: f64,
    /// Last outcomes, capped at the configured window size.
    pub window: PerformanceWindow,
    /// Consecutive correct answers; reset on any incorrect answer.
    pub streak: u32,
    /// Ids of every question served this session.
    pub used: HashSet<String>,
    /// Last served mechanics, capped at the recency-gate size.
    pub mechanic_history: MechanicRing,
    /// Served-question counts per balance side.
    pub category_tally: CategoryTally,
    /// Every answered question, in answer order.
    pub history: Vec<AnsweredRecord>,
    /// Questions until the next level adjustment is permitted.
    pub cooldown_remaining: u32,
    /// Calibration questions served so far.
    pub calibration_index: usize,
    /// Questions answered so far.
    pub q_index: usize,
    /// When the session was created.
    pub started_at: DateTime<Utc>,

    calibration_target: usize,
    question_target: usize,
}

impl SessionState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            current_level: NovakidLevel::new(1).expect("1 is a valid level"),
            momentum: 0.0,
            window: PerformanceWindow::new(config.performance_window_size),
            streak: 0,
            used: HashSet::new(),
            mechanic_history: MechanicRing::new(config.mechanic_history_size),
            category_tally: CategoryTally::default(),
            history: Vec::with_capacity(config.questions_per_test),
            cooldown_remaining: 0,
            calibration_index: 0,
            q_index: 0,
            started_at: Utc::now(),
            calibration_target: config.calibration_questions,
            question_target: config.questions_per_test,
        }
    }

    pub fn phase(&self) -> TestPhase {
        if self.q_index < self.calibration_target {
            TestPhase::Calibrating
        } else if self.q_index < self.question_target {
            TestPhase::Adaptive
        } else {
            TestPhase::Complete
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.phase() == TestPhase::Calibrating
    }

    pub fn questions_remaining(&self) -> usize {
        self.question_target.saturating_sub(self.q_index)
    }

    pub fn question_target(&self) -> usize {
        self.question_target
    }

    /// Accuracy over the whole answered history, or `None` before the first
    /// answer.
    pub fn overall_accuracy(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let correct = self.history.iter().filter(|r| r.correct).count();
        Some(correct as f64 / self.history.len() as f64)
    }
}
