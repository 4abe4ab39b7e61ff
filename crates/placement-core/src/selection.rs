//! Next-question selection policy.
//!
//! Selection runs in two phases. Calibration serves three questions from the
//! fixed level sequence 0, 1, 2 with a restricted mechanic set. The adaptive
//! phase builds a candidate level set around the current estimate, filters it
//! through the curriculum, recency, and category-balance gates, and samples
//! uniformly from the top of a stable ordering. Gates relax one at a time
//! (category, then recency, then exploration radius) whenever they would
//! leave nothing to serve; the policy only gives up once every question in
//! the bank has been used.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::bank::QuestionBank;
use crate::config::EngineConfig;
use crate::domain::{BalanceSide, Mechanic, NovakidLevel, Question, ServedQuestion};
use crate::session::{SessionState, TestPhase};

/// Fixed level sequence for the calibration phase.
const CALIBRATION_LEVELS: [u8; 3] = [0, 1, 2];

// ============================================================================
// SELECTION ENTRY POINT
// ============================================================================

/// Pick the next question, or `None` when the unused pool is empty or the
/// session is complete.
///
/// On success the question id is inserted into the session's used set and
/// the calibration counter advances; the caller owns window/history updates
/// via the adjustment policy.
pub fn select_next<R: Rng + ?Sized>(
    state: &mut SessionState,
    bank: &QuestionBank,
    config: &EngineConfig,
    rng: &mut R,
) -> Option<ServedQuestion> {
    if state.phase() == TestPhase::Complete {
        return None;
    }

    let calibrating = state.is_calibrating();
    let candidate_levels = if calibrating {
        let idx = state.calibration_index.min(CALIBRATION_LEVELS.len() - 1);
        vec![NovakidLevel::new(CALIBRATION_LEVELS[idx]).expect("calibration levels are valid")]
    } else {
        adaptive_candidate_levels(state, config)
    };

    let question = pick_question(state, bank, config, &candidate_levels, calibrating, rng)?.clone();

    state.used.insert(question.id.clone());
    if calibrating {
        state.calibration_index += 1;
    }
    debug!(
        id = %question.id,
        level = %question.level,
        mechanic = %question.mechanic(),
        calibrating,
        "question selected"
    );

    Some(ServedQuestion {
        assigned_level: question.level,
        is_calibration: calibrating,
        question,
    })
}

// ============================================================================
// CANDIDATE LEVEL SET
// ============================================================================

/// Candidate levels for the adaptive phase.
///
/// Early questions stay within one level of the estimate, the mid phase
/// explores two levels out, and the end-test push opens the top levels for
/// students whose overall accuracy has earned a ceiling probe. The two-level
/// radius is retained through the end phase so the category balance always
/// has both sides to draw from.
fn adaptive_candidate_levels(state: &SessionState, config: &EngineConfig) -> Vec<NovakidLevel> {
    let current = state.current_level;
    let mut levels = BTreeSet::new();
    levels.insert(current);

    if state.q_index < config.early_phase_end {
        levels.insert(current.stepped(-1));
        levels.insert(current.stepped(1));
    } else {
        for delta in [-2i8, -1, 1, 2] {
            levels.insert(current.stepped(delta));
        }
    }

    if state.q_index >= config.mid_phase_end {
        let accuracy = state.overall_accuracy().unwrap_or(0.0);
        if accuracy >= config.end_push_accuracy {
            levels.insert(NovakidLevel::MAX.stepped(-1));
            levels.insert(NovakidLevel::MAX);
        }
        if accuracy >= config.end_push_runner_up_accuracy && current.value() >= 3 {
            levels.insert(current.stepped(1));
        }
    }

    levels.into_iter().collect()
}

// ============================================================================
// GATES
// ============================================================================

/// Mechanics a calibration question may use at a given level.
fn is_calibration_safe(level: NovakidLevel, mechanic: Mechanic) -> bool {
    match mechanic {
        Mechanic::WordPronunciationPractice => true,
        Mechanic::ImageSingleChoiceFromTexts => level.value() >= 1,
        Mechanic::MultipleChoiceTextText => level.value() >= 2,
        _ => false,
    }
}

/// Collect unused, curriculum-gated candidates from the given levels in a
/// stable order: closest to the current estimate first, higher level on
/// ties, bank order within a bucket.
fn gather_candidates<'a>(
    state: &'a SessionState,
    bank: &'a QuestionBank,
    levels: &[NovakidLevel],
    calibrating: bool,
) -> Vec<&'a Question> {
    let unique: BTreeSet<NovakidLevel> = levels.iter().copied().collect();
    let mut ranked: Vec<(u8, std::cmp::Reverse<u8>, usize, &Question)> = Vec::new();

    for level in unique {
        for (position, question) in bank.unused_at(level, &state.used).enumerate() {
            if !level.permits(question.mechanic()) {
                continue;
            }
            if calibrating && !is_calibration_safe(level, question.mechanic()) {
                continue;
            }
            ranked.push((
                state.current_level.distance(level),
                std::cmp::Reverse(level.value()),
                position,
                question,
            ));
        }
    }

    ranked.sort_by_key(|(distance, level, position, _)| (*distance, *level, *position));
    ranked.into_iter().map(|(_, _, _, q)| q).collect()
}

/// Recency gate: when at least one candidate offers a mechanic outside the
/// recent-history ring, drop the candidates whose mechanic is in it.
fn apply_recency_gate<'a>(pool: &[&'a Question], state: &SessionState) -> Vec<&'a Question> {
    let fresh: Vec<&Question> = pool
        .iter()
        .copied()
        .filter(|q| !state.mechanic_history.contains(q.mechanic()))
        .collect();
    if fresh.is_empty() {
        pool.to_vec()
    } else {
        fresh
    }
}

/// Balance side to serve next: forced deterministically once the served
/// imbalance reaches the configured margin, otherwise a coin biased toward
/// the under-represented side. The bool reports whether the side was forced.
fn choose_balance_side<R: Rng + ?Sized>(
    state: &SessionState,
    config: &EngineConfig,
    rng: &mut R,
) -> (BalanceSide, bool) {
    if let Some(side) = state.category_tally.forced_side(config.category_force_margin) {
        return (side, true);
    }
    let side = match state.category_tally.under_represented() {
        Some(side) => {
            if rng.gen_bool(config.balance_bias) {
                side
            } else {
                side.other()
            }
        }
        None => {
            if rng.gen_bool(0.5) {
                BalanceSide::Audio
            } else {
                BalanceSide::Text
            }
        }
    };
    (side, false)
}

fn filter_side<'a>(pool: &[&'a Question], side: BalanceSide) -> Vec<&'a Question> {
    pool.iter()
        .copied()
        .filter(|q| q.mechanic().balance_side() == side)
        .collect()
}

// ============================================================================
// SAMPLING
// ============================================================================

/// Uniform sample from the top of the stable ordering.
fn sample_top<'a, R: Rng + ?Sized>(
    pool: &[&'a Question],
    config: &EngineConfig,
    rng: &mut R,
) -> Option<&'a Question> {
    if pool.is_empty() {
        return None;
    }
    let k = pool.len().min(config.selection_pool_size);
    pool[..k].choose(rng).copied()
}

fn pick_question<'a, R: Rng + ?Sized>(
    state: &'a SessionState,
    bank: &'a QuestionBank,
    config: &EngineConfig,
    levels: &[NovakidLevel],
    calibrating: bool,
    rng: &mut R,
) -> Option<&'a Question> {
    let base = gather_candidates(state, bank, levels, calibrating);
    let recent = apply_recency_gate(&base, state);
    let (side, forced) = choose_balance_side(state, config, rng);
    let balanced = filter_side(&recent, side);

    if let Some(question) = sample_top(&balanced, config, rng) {
        return Some(question);
    }
    if forced {
        // A forced balance side outranks mechanic recency: yield the recency
        // gate before giving up on the side.
        debug!("recency gate relaxed for forced balance side");
        if let Some(question) = sample_top(&filter_side(&base, side), config, rng) {
            return Some(question);
        }
    }
    debug!("category balance gate relaxed");
    if let Some(question) = sample_top(&recent, config, rng) {
        return Some(question);
    }
    debug!("recency gate relaxed");
    if let Some(question) = sample_top(&base, config, rng) {
        return Some(question);
    }

    debug!("exploration radius widened to all levels");
    let widened = gather_candidates(state, bank, &NovakidLevel::ALL, calibrating);
    if let Some(question) = sample_top(&widened, config, rng) {
        return Some(question);
    }

    // Last resort during calibration: any unused question at all.
    if calibrating {
        let anything = gather_candidates(state, bank, &NovakidLevel::ALL, false);
        return sample_top(&anything, config, rng);
    }
    None
}
