//! Rule-based placement synthesis.
//!
//! This is the deterministic fallback report: it is always computed, always
//! valid, and is what the session emits whenever the advisory analyzer is
//! absent, disabled, or fails.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::{AnsweredRecord, NovakidLevel, SkillBucket};
use crate::scoring::report::{
    Placement, PlacementReport, Recommendations, SkillAnalysis, SkillReport,
};
use crate::session::SessionState;

/// Skill-bucket scores below this feed the immediate-focus list.
const FOCUS_THRESHOLD: f64 = 0.5;
/// Skill-bucket scores at or above this count as strengths.
const STRENGTH_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    correct: usize,
    total: usize,
}

impl Tally {
    fn add(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }
}

/// Build the deterministic fallback report from the session history.
pub fn build_fallback_report(
    state: &SessionState,
    config: &EngineConfig,
    ended_early: bool,
) -> PlacementReport {
    let history = &state.history;
    let overall_accuracy = state.overall_accuracy().unwrap_or(0.0);

    let per_level = per_level_tallies(history);
    let (placement_level, qualified) = resolve_placement(state, config, &per_level);

    let progress = (history.len() as f64 / config.questions_per_test as f64).min(1.0);
    let confidence = (progress * overall_accuracy).clamp(0.0, 1.0);

    let skill_analysis = SkillAnalysis {
        vocabulary: bucket_report(history, SkillBucket::Vocabulary),
        pronunciation: bucket_report(history, SkillBucket::Pronunciation),
        grammar: bucket_report(history, SkillBucket::Grammar),
    };

    let level_justification = build_justification(
        state,
        config,
        &per_level,
        placement_level,
        qualified,
        overall_accuracy,
        ended_early,
    );

    let recommendations =
        build_recommendations(&skill_analysis, placement_level, overall_accuracy);

    debug!(
        placement = %placement_level,
        confidence,
        qualified,
        "fallback report synthesized"
    );

    PlacementReport {
        placement: Placement {
            novakid_level: placement_level,
            confidence,
            cefr_equivalent: placement_level.cefr_label().to_string(),
            level_justification,
        },
        skill_analysis,
        recommendations,
    }
}

fn per_level_tallies(history: &[AnsweredRecord]) -> BTreeMap<NovakidLevel, Tally> {
    let mut tallies: BTreeMap<NovakidLevel, Tally> = BTreeMap::new();
    for record in history {
        tallies
            .entry(record.assigned_level)
            .or_default()
            .add(record.correct);
    }
    tallies
}

/// The placement is the highest level with enough evidence and accuracy.
/// When no level qualifies, fall back to the tracked estimate, capped by
/// the highest level the student actually attempted.
fn resolve_placement(
    state: &SessionState,
    config: &EngineConfig,
    per_level: &BTreeMap<NovakidLevel, Tally>,
) -> (NovakidLevel, bool) {
    let qualified = per_level
        .iter()
        .rev()
        .find(|(_, tally)| {
            tally.total >= config.placement_min_items
                && tally.accuracy().unwrap_or(0.0) >= config.placement_accuracy_floor
        })
        .map(|(level, _)| *level);

    if let Some(level) = qualified {
        return (level, true);
    }

    let best_attained = state.history.iter().map(|r| r.assigned_level).max();
    let capped = match best_attained {
        Some(best) => state.current_level.min(best),
        None => state.current_level,
    };
    (capped, false)
}

fn bucket_report(history: &[AnsweredRecord], bucket: SkillBucket) -> SkillReport {
    let mut tally = Tally::default();
    let mut anomalies = 0usize;
    for record in history {
        if record.skill.bucket() == bucket {
            tally.add(record.correct);
            if record.anomaly.is_some() {
                anomalies += 1;
            }
        }
    }

    match tally.accuracy() {
        None => SkillReport {
            score: None,
            evidence: vec!["insufficient-evidence".to_string()],
        },
        Some(accuracy) => {
            let mut evidence = vec![format!(
                "{}/{} correct ({:.0}%)",
                tally.correct,
                tally.total,
                accuracy * 100.0
            )];
            if anomalies > 0 {
                evidence.push(format!("{anomalies} answers arrived malformed"));
            }
            SkillReport {
                score: Some(accuracy),
                evidence,
            }
        }
    }
}

fn build_justification(
    state: &SessionState,
    config: &EngineConfig,
    per_level: &BTreeMap<NovakidLevel, Tally>,
    placement_level: NovakidLevel,
    qualified: bool,
    overall_accuracy: f64,
    ended_early: bool,
) -> String {
    let mut justification = format!(
        "Answered {} of {} questions with {:.0}% overall accuracy.",
        state.history.len(),
        config.questions_per_test,
        overall_accuracy * 100.0
    );

    if qualified {
        if let Some(tally) = per_level.get(&placement_level) {
            justification.push_str(&format!(
                " Held {:.0}% accuracy across {} questions at level {}.",
                tally.accuracy().unwrap_or(0.0) * 100.0,
                tally.total,
                placement_level
            ));
        }
    } else {
        justification.push_str(
            " No single level met the placement bar; using the final tracked estimate \
             capped at the highest level attempted.",
        );
    }

    if ended_early {
        justification.push_str(&format!(
            " Warning: the question pool was exhausted after {} questions, so this \
             placement rests on a shortened test.",
            state.history.len()
        ));
    }

    if state.momentum >= 1.0 {
        justification.push_str(" The student finished on a clear upward trend.");
    } else if state.momentum <= -1.0 {
        justification.push_str(" The student finished on a downward trend.");
    }

    justification
}

fn build_recommendations(
    skills: &SkillAnalysis,
    placement_level: NovakidLevel,
    overall_accuracy: f64,
) -> Recommendations {
    let named = [
        (SkillBucket::Vocabulary, &skills.vocabulary),
        (SkillBucket::Pronunciation, &skills.pronunciation),
        (SkillBucket::Grammar, &skills.grammar),
    ];

    let mut immediate_focus = Vec::new();
    let mut strengths = Vec::new();
    for (bucket, report) in named {
        match report.score {
            Some(score) if score < FOCUS_THRESHOLD => {
                immediate_focus.push(format!(
                    "Strengthen {} with level {} activities",
                    bucket.as_str(),
                    placement_level
                ));
            }
            Some(score) if score >= STRENGTH_THRESHOLD => {
                strengths.push(format!(
                    "Consistent {} performance to build on",
                    bucket.as_str()
                ));
            }
            _ => {}
        }
    }
    if immediate_focus.is_empty() && overall_accuracy < FOCUS_THRESHOLD {
        immediate_focus
            .push("Build confidence with short, frequent practice sessions".to_string());
    }

    let estimated_progress = if overall_accuracy >= 0.85 {
        "Ready to advance quickly; expect steady level gains with regular lessons".to_string()
    } else if overall_accuracy >= 0.60 {
        "Steady progress expected with consistent weekly practice".to_string()
    } else {
        "Gradual progress expected; foundational review will pay off first".to_string()
    };

    Recommendations {
        immediate_focus,
        strengths_to_build_on: strengths,
        suggested_starting_point: format!("Begin at Novakid Level {placement_level}"),
        estimated_progress,
    }
}
