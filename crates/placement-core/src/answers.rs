//! Answer input shapes and pure per-mechanic answer checking.
//!
//! The renderer captures one [`AnswerInput`] per served question and hands it
//! back; [`check_answer`] is a pure function over the question payload. A
//! shape that does not match the mechanic scores as incorrect and carries an
//! anomaly note, so a renderer bug can never abort a session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{MechanicPayload, Question};

/// Fraction of items that must land in their own category for an
/// audio-category-sorting answer to pass.
const SORT_PASS_RATIO: f64 = 0.6;

/// Student self-assessment after a pronunciation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfAssessment {
    Well,
    Okay,
    TryAgain,
}

impl SelfAssessment {
    /// Well and Okay count as a pass.
    pub fn passes(self) -> bool {
        !matches!(self, SelfAssessment::TryAgain)
    }
}

/// Answer captured by the renderer for one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerInput {
    /// Selected option index (choice mechanics).
    OptionIndex { value: usize },
    /// Self-assessment after a pronunciation attempt.
    SelfAssessment { value: SelfAssessment },
    /// Ordered word indices (sentence scramble).
    Ordering { values: Vec<usize> },
    /// Mapping of category name to placed item ids (category sorting).
    Sort {
        placements: HashMap<String, Vec<String>>,
    },
}

impl AnswerInput {
    fn kind(&self) -> &'static str {
        match self {
            AnswerInput::OptionIndex { .. } => "option_index",
            AnswerInput::SelfAssessment { .. } => "self_assessment",
            AnswerInput::Ordering { .. } => "ordering",
            AnswerInput::Sort { .. } => "sort",
        }
    }
}

/// Outcome of checking one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedAnswer {
    pub correct: bool,
    /// Present when the answer shape did not match the mechanic.
    pub anomaly: Option<String>,
}

impl CheckedAnswer {
    fn correct(correct: bool) -> Self {
        Self {
            correct,
            anomaly: None,
        }
    }

    fn anomaly(note: String) -> Self {
        Self {
            correct: false,
            anomaly: Some(note),
        }
    }
}

/// The correct answer for a question, shaped as the renderer would submit
/// it. Scripted sessions and developer tooling replay it through
/// [`check_answer`].
pub fn answer_key(question: &Question) -> AnswerInput {
    match &question.payload {
        MechanicPayload::WordPronunciationPractice { .. }
        | MechanicPayload::SentencePronunciationPractice { .. } => AnswerInput::SelfAssessment {
            value: SelfAssessment::Well,
        },
        MechanicPayload::AudioSingleChoiceFromImages { correct_index, .. }
        | MechanicPayload::ImageSingleChoiceFromTexts { correct_index, .. }
        | MechanicPayload::MultipleChoiceTextText { correct_index, .. } => {
            AnswerInput::OptionIndex {
                value: *correct_index,
            }
        }
        MechanicPayload::SentenceScramble { correct_order, .. } => AnswerInput::Ordering {
            values: correct_order.clone(),
        },
        MechanicPayload::AudioCategorySorting { items, .. } => {
            let mut placements: HashMap<String, Vec<String>> = HashMap::new();
            for item in items {
                placements
                    .entry(item.category.clone())
                    .or_default()
                    .push(item.id.clone());
            }
            AnswerInput::Sort { placements }
        }
    }
}

/// Check an answer against its question. Pure; never fails.
pub fn check_answer(question: &Question, answer: &AnswerInput) -> CheckedAnswer {
    match (&question.payload, answer) {
        (
            MechanicPayload::WordPronunciationPractice { .. }
            | MechanicPayload::SentencePronunciationPractice { .. },
            AnswerInput::SelfAssessment { value },
        ) => CheckedAnswer::correct(value.passes()),

        (
            MechanicPayload::AudioSingleChoiceFromImages {
                image_options: options,
                correct_index,
                ..
            }
            | MechanicPayload::ImageSingleChoiceFromTexts {
                options,
                correct_index,
                ..
            }
            | MechanicPayload::MultipleChoiceTextText {
                options,
                correct_index,
                ..
            },
            AnswerInput::OptionIndex { value },
        ) => {
            if *value >= options.len() {
                CheckedAnswer::anomaly(format!(
                    "option index {} outside {} options",
                    value,
                    options.len()
                ))
            } else {
                CheckedAnswer::correct(value == correct_index)
            }
        }

        (
            MechanicPayload::SentenceScramble { correct_order, .. },
            AnswerInput::Ordering { values },
        ) => CheckedAnswer::correct(values == correct_order),

        (
            MechanicPayload::AudioCategorySorting { items, .. },
            AnswerInput::Sort { placements },
        ) => {
            // An item is placed correctly when it appears in exactly its own
            // category's list.
            let mut placed: HashMap<&str, Vec<&str>> = HashMap::new();
            for (category, ids) in placements {
                for id in ids {
                    placed.entry(id.as_str()).or_default().push(category.as_str());
                }
            }
            let correct_count = items
                .iter()
                .filter(|item| {
                    placed
                        .get(item.id.as_str())
                        .is_some_and(|cats| cats.len() == 1 && cats[0] == item.category)
                })
                .count();
            let ratio = correct_count as f64 / items.len() as f64;
            CheckedAnswer::correct(ratio >= SORT_PASS_RATIO)
        }

        (payload, answer) => CheckedAnswer::anomaly(format!(
            "{} input does not match {}",
            answer.kind(),
            payload.mechanic()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NovakidLevel, Skill, SortItem};

    fn choice_question() -> Question {
        Question {
            id: "q-choice".to_string(),
            skill: Skill::Vocabulary,
            difficulty: 0.4,
            level: NovakidLevel::new(2).unwrap(),
            payload: MechanicPayload::MultipleChoiceTextText {
                prompt: "Pick the fruit".to_string(),
                options: vec!["apple".into(), "chair".into(), "run".into()],
                correct_index: 0,
            },
        }
    }

    fn pronunciation_question() -> Question {
        Question {
            id: "q-pron".to_string(),
            skill: Skill::Pronunciation,
            difficulty: 0.2,
            level: NovakidLevel::new(0).unwrap(),
            payload: MechanicPayload::WordPronunciationPractice {
                target_word: "cat".to_string(),
                phonetic: "kaet".to_string(),
                image_description: None,
            },
        }
    }

    fn scramble_question() -> Question {
        Question {
            id: "q-scramble".to_string(),
            skill: Skill::Grammar,
            difficulty: 0.6,
            level: NovakidLevel::new(3).unwrap(),
            payload: MechanicPayload::SentenceScramble {
                scrambled_words: vec!["like".into(), "I".into(), "dogs".into()],
                correct_order: vec![1, 0, 2],
            },
        }
    }

    fn sorting_question() -> Question {
        Question {
            id: "q-sort".to_string(),
            skill: Skill::Vocabulary,
            difficulty: 0.5,
            level: NovakidLevel::new(2).unwrap(),
            payload: MechanicPayload::AudioCategorySorting {
                categories: vec!["animals".into(), "food".into()],
                items: vec![
                    SortItem {
                        id: "i1".into(),
                        text: "dog".into(),
                        category: "animals".into(),
                    },
                    SortItem {
                        id: "i2".into(),
                        text: "cat".into(),
                        category: "animals".into(),
                    },
                    SortItem {
                        id: "i3".into(),
                        text: "bread".into(),
                        category: "food".into(),
                    },
                    SortItem {
                        id: "i4".into(),
                        text: "milk".into(),
                        category: "food".into(),
                    },
                    SortItem {
                        id: "i5".into(),
                        text: "rice".into(),
                        category: "food".into(),
                    },
                ],
            },
        }
    }

    #[test]
    fn test_choice_correct_and_incorrect() {
        let q = choice_question();
        assert!(check_answer(&q, &AnswerInput::OptionIndex { value: 0 }).correct);
        assert!(!check_answer(&q, &AnswerInput::OptionIndex { value: 1 }).correct);
    }

    #[test]
    fn test_choice_index_out_of_range_is_anomalous() {
        let q = choice_question();
        let checked = check_answer(&q, &AnswerInput::OptionIndex { value: 10 });
        assert!(!checked.correct);
        assert!(checked.anomaly.is_some());
    }

    #[rstest::rstest]
    #[case(SelfAssessment::Well, true)]
    #[case(SelfAssessment::Okay, true)]
    #[case(SelfAssessment::TryAgain, false)]
    fn test_pronunciation_self_assessment(
        #[case] value: SelfAssessment,
        #[case] expected: bool,
    ) {
        let q = pronunciation_question();
        let checked = check_answer(&q, &AnswerInput::SelfAssessment { value });
        assert_eq!(checked.correct, expected);
        assert!(checked.anomaly.is_none());
    }

    #[test]
    fn test_scramble_requires_exact_order() {
        let q = scramble_question();
        assert!(
            check_answer(
                &q,
                &AnswerInput::Ordering {
                    values: vec![1, 0, 2]
                }
            )
            .correct
        );
        assert!(
            !check_answer(
                &q,
                &AnswerInput::Ordering {
                    values: vec![0, 1, 2]
                }
            )
            .correct
        );
    }

    #[test]
    fn test_sort_passes_at_sixty_percent() {
        let q = sorting_question();
        // i1, i2, i3 placed right, i4 and i5 swapped in: 3 of 5 = 0.6, passes
        let mut placements = HashMap::new();
        placements.insert(
            "animals".to_string(),
            vec![
                "i1".to_string(),
                "i2".to_string(),
                "i4".to_string(),
                "i5".to_string(),
            ],
        );
        placements.insert("food".to_string(), vec!["i3".to_string()]);
        assert!(check_answer(&q, &AnswerInput::Sort { placements }).correct);

        // Only i1 and i4 placed right: 2 of 5 = 0.4, fails
        let mut placements = HashMap::new();
        placements.insert(
            "animals".to_string(),
            vec!["i1".to_string(), "i3".to_string(), "i5".to_string()],
        );
        placements.insert(
            "food".to_string(),
            vec!["i2".to_string(), "i4".to_string()],
        );
        assert!(!check_answer(&q, &AnswerInput::Sort { placements }).correct);
    }

    #[test]
    fn test_sort_duplicate_placement_counts_as_wrong() {
        let q = sorting_question();
        let mut placements = HashMap::new();
        // Every item dumped into both categories places nothing correctly.
        let all: Vec<String> = (1..=5).map(|i| format!("i{i}")).collect();
        placements.insert("animals".to_string(), all.clone());
        placements.insert("food".to_string(), all);
        assert!(!check_answer(&q, &AnswerInput::Sort { placements }).correct);
    }

    #[test]
    fn test_answer_key_always_checks_correct() {
        for question in [
            choice_question(),
            pronunciation_question(),
            scramble_question(),
            sorting_question(),
        ] {
            let checked = check_answer(&question, &answer_key(&question));
            assert!(checked.correct, "answer key failed for {}", question.id);
            assert!(checked.anomaly.is_none());
        }
    }

    #[test]
    fn test_shape_mismatch_is_incorrect_with_anomaly() {
        let q = choice_question();
        let checked = check_answer(
            &q,
            &AnswerInput::SelfAssessment {
                value: SelfAssessment::Well,
            },
        );
        assert!(!checked.correct);
        let note = checked.anomaly.unwrap();
        assert!(note.contains("self_assessment"));
        assert!(note.contains("multiple-choice-text-text"));
    }
}
