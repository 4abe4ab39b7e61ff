//! Engine configuration, loaded once at startup.

use serde::{Deserialize, Serialize};

/// Process-wide knobs for the placement engine.
///
/// Every threshold the selection and adjustment policies consult lives here
/// so a deployment can retune the test without touching policy code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // ==========================================================================
    // Test Shape
    // ==========================================================================
    /// Total questions per test
    ///
    /// Default: 15
    pub questions_per_test: usize,

    /// Fixed-level questions served before the adaptive phase begins
    ///
    /// Default: 3
    pub calibration_questions: usize,

    /// Outcomes kept in the rolling performance window
    ///
    /// Default: 5
    pub performance_window_size: usize,

    /// Outcomes the short-accuracy check looks at
    ///
    /// Default: 3
    pub short_window_size: usize,

    // ==========================================================================
    // Level Adjustment
    // ==========================================================================
    /// Short-window accuracy required for a standard one-level promotion
    ///
    /// Default: 0.75
    pub level_up_threshold: f64,

    /// Consecutive correct answers required for a standard promotion
    ///
    /// Default: 3
    pub level_up_streak: u32,

    /// Short-window accuracy at or below which a demotion fires
    ///
    /// Default: 0.30
    pub level_down_threshold: f64,

    /// Short-window accuracy required for a two-level jump
    ///
    /// Default: 0.90
    pub strong_jump_accuracy: f64,

    /// Consecutive correct answers required for a two-level jump
    ///
    /// Default: 4
    pub strong_jump_streak: u32,

    /// Short-window accuracy required to push a level-4 student to 5 early
    ///
    /// Default: 0.85
    pub ceiling_push_accuracy: f64,

    /// Streak required for the early ceiling push
    ///
    /// Default: 2
    pub ceiling_push_streak: u32,

    /// Latest question index (inclusive) at which the early ceiling push may fire
    ///
    /// Default: 10
    pub ceiling_push_max_index: usize,

    /// Incorrect answers in the last four required to drop from level 5
    ///
    /// Default: 3
    pub ceiling_drop_incorrect: usize,

    /// Questions until the next level adjustment after any adjustment
    ///
    /// Default: 2
    pub adjust_cooldown: u32,

    // ==========================================================================
    // Momentum
    // ==========================================================================
    /// Momentum gained on a correct answer
    ///
    /// Default: 0.3
    pub momentum_gain: f64,

    /// Momentum lost on an incorrect answer
    ///
    /// Default: 0.5
    pub momentum_loss: f64,

    /// Momentum is clamped to [-bound, +bound]
    ///
    /// Default: 2.0
    pub momentum_bound: f64,

    // ==========================================================================
    // Selection
    // ==========================================================================
    /// First question index of the mid exploration phase
    ///
    /// Below this index candidate levels span current ± 1.
    /// Default: 8
    pub early_phase_end: usize,

    /// First question index of the end-test phase
    ///
    /// From early_phase_end up to here candidate levels span current ± 2.
    /// Default: 13
    pub mid_phase_end: usize,

    /// Overall accuracy that opens levels 4 and 5 during the end-test push
    ///
    /// Default: 0.85
    pub end_push_accuracy: f64,

    /// Overall accuracy that opens current + 1 for students already at 3+
    ///
    /// Default: 0.70
    pub end_push_runner_up_accuracy: f64,

    /// Served-category imbalance at which the under-represented side is forced
    ///
    /// Default: 2
    pub category_force_margin: u32,

    /// Probability the balance coin lands on the under-represented side
    ///
    /// Default: 0.7
    pub balance_bias: f64,

    /// Size of the stable-order pool the final pick samples from
    ///
    /// Default: 5
    pub selection_pool_size: usize,

    /// Served mechanics remembered by the recency gate
    ///
    /// Default: 2
    pub mechanic_history_size: usize,

    // ==========================================================================
    // Scoring
    // ==========================================================================
    /// Per-level accuracy required for a level to qualify as the placement
    ///
    /// Default: 0.70
    pub placement_accuracy_floor: f64,

    /// Items required at a level before its accuracy counts
    ///
    /// Default: 2
    pub placement_min_items: usize,

    // ==========================================================================
    // Advisory Analyzer
    // ==========================================================================
    /// Whether the advisory analyzer is consulted when one is wired in
    ///
    /// Default: true
    pub advisor_enabled: bool,

    /// Wall-clock budget for one analyzer call
    ///
    /// Default: 30
    pub advisor_timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Test shape
            questions_per_test: 15,
            calibration_questions: 3,
            performance_window_size: 5,
            short_window_size: 3,

            // Level adjustment
            level_up_threshold: 0.75,
            level_up_streak: 3,
            level_down_threshold: 0.30,
            strong_jump_accuracy: 0.90,
            strong_jump_streak: 4,
            ceiling_push_accuracy: 0.85,
            ceiling_push_streak: 2,
            ceiling_push_max_index: 10,
            ceiling_drop_incorrect: 3,
            adjust_cooldown: 2,

            // Momentum
            momentum_gain: 0.3,
            momentum_loss: 0.5,
            momentum_bound: 2.0,

            // Selection
            early_phase_end: 8,
            mid_phase_end: 13,
            end_push_accuracy: 0.85,
            end_push_runner_up_accuracy: 0.70,
            category_force_margin: 2,
            balance_bias: 0.7,
            selection_pool_size: 5,
            mechanic_history_size: 2,

            // Scoring
            placement_accuracy_floor: 0.70,
            placement_min_items: 2,

            // Advisor
            advisor_enabled: true,
            advisor_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_published_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.questions_per_test, 15);
        assert_eq!(config.calibration_questions, 3);
        assert_eq!(config.performance_window_size, 5);
        assert!((config.level_up_threshold - 0.75).abs() < f64::EPSILON);
        assert!((config.level_down_threshold - 0.30).abs() < f64::EPSILON);
        assert!((config.strong_jump_accuracy - 0.90).abs() < f64::EPSILON);
        assert_eq!(config.strong_jump_streak, 4);
        assert_eq!(config.adjust_cooldown, 2);
        assert_eq!(config.advisor_timeout_seconds, 30);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.questions_per_test, config.questions_per_test);
        assert!((back.balance_bias - config.balance_bias).abs() < f64::EPSILON);
    }
}
