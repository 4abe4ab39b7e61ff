//! Question bank loading and validation.
//!
//! The bank is a JSON blob keyed by level strings `"0"`..`"5"`, each holding
//! an ordered array of question records. It is loaded once at startup,
//! validated, and then shared read-only across sessions.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::domain::{EngineError, MechanicPayload, NovakidLevel, Question};

/// Immutable mapping from level to its ordered question list.
///
/// Bank order within a level is preserved from the blob; the selection policy
/// relies on it as the stable ordering behind the top-5 sampling rule.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    levels: BTreeMap<NovakidLevel, Vec<Question>>,
}

impl QuestionBank {
    /// Parse and validate a bank blob.
    ///
    /// Fails with [`EngineError::BankMalformed`] when the blob is unreadable
    /// or any record is invalid, and with [`EngineError::BankLevelGap`] when
    /// any level 0-5 is absent or empty.
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| EngineError::BankMalformed(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Build a bank from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        let buckets: HashMap<String, Vec<Question>> = serde_json::from_value(value)
            .map_err(|e| EngineError::BankMalformed(format!("invalid bank shape: {e}")))?;

        let mut levels: BTreeMap<NovakidLevel, Vec<Question>> = BTreeMap::new();
        for (key, mut questions) in buckets {
            let level = parse_level_key(&key)?;
            for question in &mut questions {
                question.level = level;
            }
            levels.insert(level, questions);
        }

        let bank = Self { levels };
        bank.validate()?;
        debug!(total = bank.total_questions(), "question bank loaded");
        Ok(bank)
    }

    fn validate(&self) -> Result<(), EngineError> {
        for level in NovakidLevel::ALL {
            let questions = self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[]);
            if questions.is_empty() {
                return Err(EngineError::BankLevelGap(level.value()));
            }
        }

        let mut seen_ids = HashSet::new();
        for (level, questions) in &self.levels {
            for question in questions {
                validate_question(question)?;
                if !level.permits(question.mechanic()) {
                    return Err(EngineError::BankMalformed(format!(
                        "question {} uses {} which is not permitted at level {}",
                        question.id,
                        question.mechanic(),
                        level
                    )));
                }
                if !seen_ids.insert(question.id.clone()) {
                    return Err(EngineError::BankMalformed(format!(
                        "duplicate question id {}",
                        question.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Questions in the bucket for `level`, in bank order.
    pub fn questions_at(&self, level: NovakidLevel) -> &[Question] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Unused questions at `level`, in bank order.
    pub fn unused_at<'a>(
        &'a self,
        level: NovakidLevel,
        used: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a Question> {
        self.questions_at(level)
            .iter()
            .filter(move |q| !used.contains(&q.id))
    }

    pub fn total_questions(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }

    /// True when at least one question anywhere has not been served.
    pub fn has_unused(&self, used: &HashSet<String>) -> bool {
        self.levels
            .values()
            .flatten()
            .any(|q| !used.contains(&q.id))
    }
}

fn parse_level_key(key: &str) -> Result<NovakidLevel, EngineError> {
    let value: u8 = key
        .parse()
        .map_err(|_| EngineError::BankMalformed(format!("level key {key:?} is not an integer")))?;
    NovakidLevel::new(value)
        .map_err(|_| EngineError::BankMalformed(format!("level key {key:?} is out of range")))
}

fn validate_question(question: &Question) -> Result<(), EngineError> {
    let malformed = |reason: String| EngineError::BankMalformed(reason);

    if question.id.trim().is_empty() {
        return Err(malformed("question with empty id".to_string()));
    }
    if !(0.0..=1.0).contains(&question.difficulty) {
        return Err(malformed(format!(
            "question {} difficulty {} outside [0, 1]",
            question.id, question.difficulty
        )));
    }

    match &question.payload {
        MechanicPayload::WordPronunciationPractice {
            target_word,
            phonetic,
            ..
        } => {
            if target_word.is_empty() || phonetic.is_empty() {
                return Err(malformed(format!(
                    "question {} is missing target word or phonetic",
                    question.id
                )));
            }
        }
        MechanicPayload::SentencePronunciationPractice { sentence, .. } => {
            if sentence.is_empty() {
                return Err(malformed(format!(
                    "question {} is missing its sentence",
                    question.id
                )));
            }
        }
        MechanicPayload::AudioSingleChoiceFromImages {
            audio_text,
            image_options,
            correct_index,
        } => {
            if audio_text.is_empty() {
                return Err(malformed(format!(
                    "question {} is missing audio text",
                    question.id
                )));
            }
            validate_choice(&question.id, image_options.len(), *correct_index)?;
        }
        MechanicPayload::ImageSingleChoiceFromTexts {
            image_description,
            options,
            correct_index,
        } => {
            if image_description.is_empty() {
                return Err(malformed(format!(
                    "question {} is missing its image description",
                    question.id
                )));
            }
            validate_choice(&question.id, options.len(), *correct_index)?;
        }
        MechanicPayload::MultipleChoiceTextText {
            prompt,
            options,
            correct_index,
        } => {
            if prompt.is_empty() {
                return Err(malformed(format!(
                    "question {} is missing its prompt",
                    question.id
                )));
            }
            validate_choice(&question.id, options.len(), *correct_index)?;
        }
        MechanicPayload::AudioCategorySorting { categories, items } => {
            if categories.len() < 2 {
                return Err(malformed(format!(
                    "question {} needs at least two sorting categories",
                    question.id
                )));
            }
            if items.is_empty() {
                return Err(malformed(format!(
                    "question {} has no items to sort",
                    question.id
                )));
            }
            for item in items {
                if !categories.contains(&item.category) {
                    return Err(malformed(format!(
                        "question {} item {} references unknown category {}",
                        question.id, item.id, item.category
                    )));
                }
            }
        }
        MechanicPayload::SentenceScramble {
            scrambled_words,
            correct_order,
        } => {
            if scrambled_words.len() < 2 {
                return Err(malformed(format!(
                    "question {} needs at least two words to scramble",
                    question.id
                )));
            }
            let mut indices: Vec<usize> = correct_order.clone();
            indices.sort_unstable();
            let expected: Vec<usize> = (0..scrambled_words.len()).collect();
            if indices != expected {
                return Err(malformed(format!(
                    "question {} correct_order is not a permutation of its words",
                    question.id
                )));
            }
        }
    }
    Ok(())
}

fn validate_choice(id: &str, options: usize, correct_index: usize) -> Result<(), EngineError> {
    if options < 2 {
        return Err(EngineError::BankMalformed(format!(
            "question {id} needs at least two options"
        )));
    }
    if correct_index >= options {
        return Err(EngineError::BankMalformed(format!(
            "question {id} correct_index {correct_index} outside its {options} options"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_bank_json() -> String {
        let mut levels = Vec::new();
        for level in 0..=5u8 {
            let mechanic_fields = if level == 0 {
                r#""mechanic": "word-pronunciation-practice", "target_word": "cat", "phonetic": "kaet""#
            } else if level == 1 {
                r#""mechanic": "image-single-choice-from-texts", "image_description": "a red apple", "options": ["apple", "dog"], "correct_index": 0"#
            } else {
                r#""mechanic": "multiple-choice-text-text", "prompt": "Pick the animal", "options": ["dog", "table"], "correct_index": 0"#
            };
            levels.push(format!(
                r#""{level}": [{{"id": "q-{level}-0", "skill": "Vocabulary", "difficulty": 0.5, {mechanic_fields}}}]"#
            ));
        }
        format!("{{{}}}", levels.join(","))
    }

    #[test]
    fn test_loads_minimal_bank() {
        let bank = QuestionBank::from_json_str(&minimal_bank_json()).unwrap();
        assert_eq!(bank.total_questions(), 6);
        let l0 = NovakidLevel::new(0).unwrap();
        assert_eq!(bank.questions_at(l0).len(), 1);
        assert_eq!(bank.questions_at(l0)[0].level, l0);
    }

    #[test]
    fn test_rejects_unreadable_blob() {
        assert!(matches!(
            QuestionBank::from_json_str("not json"),
            Err(EngineError::BankMalformed(_))
        ));
    }

    #[test]
    fn test_rejects_empty_level_bucket() {
        let mut value: serde_json::Value =
            serde_json::from_str(&minimal_bank_json()).unwrap();
        value["3"] = serde_json::json!([]);
        assert!(matches!(
            QuestionBank::from_value(value),
            Err(EngineError::BankLevelGap(3))
        ));
    }

    #[test]
    fn test_rejects_absent_level() {
        let mut value: serde_json::Value =
            serde_json::from_str(&minimal_bank_json()).unwrap();
        value.as_object_mut().unwrap().remove("5");
        assert!(matches!(
            QuestionBank::from_value(value),
            Err(EngineError::BankLevelGap(5))
        ));
    }

    #[test]
    fn test_rejects_unknown_level_key() {
        let raw = minimal_bank_json().replace(r#""5":"#, r#""9":"#);
        assert!(matches!(
            QuestionBank::from_json_str(&raw),
            Err(EngineError::BankMalformed(_))
        ));
    }

    #[test]
    fn test_rejects_curriculum_violation() {
        // sentence-scramble is not permitted at level 1
        let raw = minimal_bank_json().replace(
            r#""mechanic": "image-single-choice-from-texts", "image_description": "a red apple", "options": ["apple", "dog"], "correct_index": 0"#,
            r#""mechanic": "sentence-scramble", "scrambled_words": ["I", "run"], "correct_order": [0, 1]"#,
        );
        assert!(matches!(
            QuestionBank::from_json_str(&raw),
            Err(EngineError::BankMalformed(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let raw = minimal_bank_json().replace("q-1-0", "q-0-0");
        assert!(matches!(
            QuestionBank::from_json_str(&raw),
            Err(EngineError::BankMalformed(_))
        ));
    }

    #[test]
    fn test_rejects_bad_correct_index() {
        let raw = minimal_bank_json().replace(
            r#""options": ["apple", "dog"], "correct_index": 0"#,
            r#""options": ["apple", "dog"], "correct_index": 5"#,
        );
        assert!(matches!(
            QuestionBank::from_json_str(&raw),
            Err(EngineError::BankMalformed(_))
        ));
    }

    #[test]
    fn test_unused_iterator_skips_served_ids() {
        let bank = QuestionBank::from_json_str(&minimal_bank_json()).unwrap();
        let mut used = HashSet::new();
        used.insert("q-0-0".to_string());
        let l0 = NovakidLevel::new(0).unwrap();
        assert_eq!(bank.unused_at(l0, &used).count(), 0);
        assert!(bank.has_unused(&used));
    }
}
