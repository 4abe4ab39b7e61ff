//! Post-answer adjustment policy.
//!
//! After every answer the session bookkeeping (window, streak, momentum,
//! tallies) is updated, and then a single level-adjustment rule may fire.
//! Rules are evaluated top to bottom; the first match terminates the cascade
//! and arms the cooldown, so aggressive moves need clear evidence and can
//! only happen one at a time.

use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::{AnsweredRecord, NovakidLevel};
use crate::session::SessionState;

/// Answers the drop-from-ceiling protection looks back over.
const CEILING_DROP_WINDOW: usize = 4;

/// Apply one answered question to the session state.
pub fn update(state: &mut SessionState, record: AnsweredRecord, config: &EngineConfig) {
    let was_calibration = state.is_calibrating();

    // Outcome bookkeeping
    state.window.push(record.correct);
    state.streak = if record.correct { state.streak + 1 } else { 0 };

    // Momentum: slow to warm, quick to cool
    let delta = if record.correct {
        config.momentum_gain
    } else {
        -config.momentum_loss
    };
    state.momentum = (state.momentum + delta).clamp(-config.momentum_bound, config.momentum_bound);

    state.category_tally.record(record.mechanic.balance_side());
    state.mechanic_history.push(record.mechanic);
    state.history.push(record);
    state.q_index += 1;

    // Cooldown gates any level change; calibration answers do not consume it.
    if state.cooldown_remaining > 0 {
        if !was_calibration {
            state.cooldown_remaining -= 1;
        }
        return;
    }

    apply_level_rules(state, config);

    // stepped() clamps every transition, but keep the hard bound anyway.
    debug_assert!(state.current_level <= NovakidLevel::MAX);
}

fn apply_level_rules(state: &mut SessionState, config: &EngineConfig) {
    let Some(short_acc) = state.window.accuracy_over_last(config.short_window_size) else {
        return;
    };
    let level = state.current_level;
    let streak = state.streak;

    // Level-up rules, strongest first
    if level.value() == 4
        && state.q_index <= config.ceiling_push_max_index
        && streak >= config.ceiling_push_streak
        && short_acc >= config.ceiling_push_accuracy
    {
        adjust(state, NovakidLevel::MAX, config, "early ceiling push");
    } else if short_acc >= config.strong_jump_accuracy
        && streak >= config.strong_jump_streak
        && level.value() <= 3
    {
        adjust(state, level.stepped(2), config, "strong jump");
    } else if short_acc >= config.level_up_threshold
        && streak >= config.level_up_streak
        && level < NovakidLevel::MAX
    {
        adjust(state, level.stepped(1), config, "standard up");
    }
    // Level-down rules
    else if level == NovakidLevel::MAX {
        // Drop-from-ceiling protection: level 5 only gives way on three
        // misses in the last four answers.
        if state.window.incorrect_in_last(CEILING_DROP_WINDOW) >= config.ceiling_drop_incorrect {
            adjust(state, level.stepped(-1), config, "ceiling drop");
        }
    } else if short_acc <= config.level_down_threshold && level > NovakidLevel::MIN {
        adjust(state, level.stepped(-1), config, "standard down");
    }
}

fn adjust(state: &mut SessionState, new_level: NovakidLevel, config: &EngineConfig, rule: &str) {
    debug!(
        from = %state.current_level,
        to = %new_level,
        rule,
        q_index = state.q_index,
        "level adjusted"
    );
    state.current_level = new_level;
    state.cooldown_remaining = config.adjust_cooldown;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Mechanic, Skill};

    fn record(correct: bool) -> AnsweredRecord {
        AnsweredRecord {
            question_id: format!("q-{}", rand::random::<u32>()),
            mechanic: Mechanic::MultipleChoiceTextText,
            assigned_level: NovakidLevel::new(2).unwrap(),
            skill: Skill::Grammar,
            correct,
            response_time: 2.5,
            anomaly: None,
        }
    }

    fn state_at(level: u8, q_index: usize) -> (SessionState, EngineConfig) {
        let config = EngineConfig::default();
        let mut state = SessionState::new(&config);
        state.current_level = NovakidLevel::new(level).unwrap();
        state.q_index = q_index;
        (state, config)
    }

    fn feed(state: &mut SessionState, config: &EngineConfig, outcomes: &[bool]) {
        for &correct in outcomes {
            update(state, record(correct), config);
        }
    }

    #[test]
    fn test_momentum_moves_and_clamps() {
        let (mut state, config) = state_at(1, 5);
        feed(&mut state, &config, &[true]);
        assert!((state.momentum - 0.3).abs() < 1e-9);
        feed(&mut state, &config, &[false]);
        assert!((state.momentum - (-0.2)).abs() < 1e-9);

        // Ten misses clamp at the negative bound
        feed(&mut state, &config, &[false; 10]);
        assert!((state.momentum - (-2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_streak_resets_on_miss() {
        let (mut state, config) = state_at(1, 5);
        feed(&mut state, &config, &[true, true]);
        assert_eq!(state.streak, 2);
        feed(&mut state, &config, &[false]);
        assert_eq!(state.streak, 0);
    }

    #[test]
    fn test_standard_up_needs_streak_of_three() {
        let (mut state, config) = state_at(1, 3);
        feed(&mut state, &config, &[true, true]);
        assert_eq!(state.current_level.value(), 1);
        feed(&mut state, &config, &[true]);
        assert_eq!(state.current_level.value(), 2);
        assert_eq!(state.cooldown_remaining, config.adjust_cooldown);
    }

    #[test]
    fn test_strong_jump_fires_before_standard_up() {
        let (mut state, config) = state_at(2, 3);
        // Streak of four with perfect short window: two-level jump
        feed(&mut state, &config, &[true, true]);
        // third correct answer fires a standard up first (streak 3)
        feed(&mut state, &config, &[true]);
        assert_eq!(state.current_level.value(), 3);
        // cooldown blocks the next two, then streak >= 4 earns the jump
        feed(&mut state, &config, &[true, true, true]);
        assert_eq!(state.current_level.value(), 5);
    }

    #[test]
    fn test_strong_jump_not_available_above_level_three() {
        let (mut state, config) = state_at(4, 11);
        feed(&mut state, &config, &[true, true, true, true]);
        // Ceiling push is out of range (q_index > 10), strong jump is gated
        // to level <= 3, so only the standard up fires.
        assert_eq!(state.current_level.value(), 5);
    }

    #[test]
    fn test_early_ceiling_push() {
        let (mut state, config) = state_at(4, 7);
        feed(&mut state, &config, &[true, true]);
        assert_eq!(state.current_level.value(), 5);
        assert_eq!(state.cooldown_remaining, 2);
    }

    #[test]
    fn test_ceiling_push_expires_after_question_ten() {
        let (mut state, config) = state_at(4, 9);
        // q_index becomes 11 on the second answer: push window closed,
        // standard up still needs a streak of 3.
        feed(&mut state, &config, &[true, true]);
        assert_eq!(state.current_level.value(), 4);
    }

    #[test]
    fn test_cooldown_blocks_adjustment() {
        let (mut state, config) = state_at(1, 3);
        feed(&mut state, &config, &[true, true, true]);
        assert_eq!(state.current_level.value(), 2);
        assert_eq!(state.cooldown_remaining, 2);

        // Two perfect answers while cooling: no change
        feed(&mut state, &config, &[true]);
        assert_eq!(state.current_level.value(), 2);
        assert_eq!(state.cooldown_remaining, 1);
        feed(&mut state, &config, &[true]);
        assert_eq!(state.current_level.value(), 2);
        assert_eq!(state.cooldown_remaining, 0);

        // Cooldown cleared: streak is now 5, short window perfect
        feed(&mut state, &config, &[true]);
        assert_eq!(state.current_level.value(), 4);
    }

    #[test]
    fn test_calibration_answers_do_not_consume_cooldown() {
        let (mut state, config) = state_at(1, 0);
        state.cooldown_remaining = 2;
        feed(&mut state, &config, &[true]); // q_index 0: calibration
        assert_eq!(state.cooldown_remaining, 2);
        feed(&mut state, &config, &[true, true]); // q_index 1, 2: calibration
        assert_eq!(state.cooldown_remaining, 2);
        feed(&mut state, &config, &[true]); // adaptive: decrements
        assert_eq!(state.cooldown_remaining, 1);
    }

    #[test]
    fn test_standard_down_on_poor_short_window() {
        let (mut state, config) = state_at(2, 5);
        feed(&mut state, &config, &[true, true]);
        assert_eq!(state.current_level.value(), 2);

        // One miss leaves the short window at 1/3; two more empty it out.
        feed(&mut state, &config, &[false, false]);
        assert_eq!(state.current_level.value(), 2);
        feed(&mut state, &config, &[false]);
        assert_eq!(state.current_level.value(), 1);
        assert_eq!(state.cooldown_remaining, 2);
    }

    #[test]
    fn test_level_zero_cannot_drop() {
        let (mut state, config) = state_at(0, 5);
        feed(&mut state, &config, &[false; 6]);
        assert_eq!(state.current_level.value(), 0);
    }

    #[test]
    fn test_level_five_protected_against_two_misses() {
        let (mut state, config) = state_at(5, 8);
        // 2 wrong in the last 4: protected
        feed(&mut state, &config, &[true, false, true, false]);
        assert_eq!(state.current_level.value(), 5);
    }

    #[test]
    fn test_level_five_drops_on_three_of_four_misses() {
        let (mut state, config) = state_at(5, 8);
        feed(&mut state, &config, &[false, true, false, false]);
        assert_eq!(state.current_level.value(), 4);
        assert_eq!(state.cooldown_remaining, 2);
    }

    #[test]
    fn test_oscillation_never_promotes() {
        let (mut state, config) = state_at(1, 3);
        feed(
            &mut state,
            &config,
            &[true, false, true, false, true, false, true, false],
        );
        assert_eq!(state.current_level.value(), 1);
    }

    #[test]
    fn test_history_and_index_advance_together() {
        let (mut state, config) = state_at(1, 0);
        feed(&mut state, &config, &[true, false, true]);
        assert_eq!(state.q_index, 3);
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.window.len(), 3);
    }
}
