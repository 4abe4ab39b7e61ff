//! Shared fixtures for integration tests: a well-stocked bank and scripted
//! answer helpers.

use std::collections::HashMap;
use std::sync::Arc;

use placement_core::{AnswerInput, MechanicPayload, Question, QuestionBank, SelfAssessment};
use serde_json::{json, Value};

fn wpp(id: &str, skill: &str) -> Value {
    json!({
        "id": id,
        "skill": skill,
        "difficulty": 0.3,
        "mechanic": "word-pronunciation-practice",
        "target_word": "elephant",
        "phonetic": "ˈɛlɪfənt",
        "image_description": "a grey elephant"
    })
}

fn spp(id: &str) -> Value {
    json!({
        "id": id,
        "skill": "Speaking",
        "difficulty": 0.5,
        "mechanic": "sentence-pronunciation-practice",
        "sentence": "The elephant is drinking water."
    })
}

fn ascfi(id: &str) -> Value {
    json!({
        "id": id,
        "skill": "Vocabulary",
        "difficulty": 0.4,
        "mechanic": "audio-single-choice-from-images",
        "audio_text": "elephant",
        "image_options": ["a grey elephant", "a small mouse", "a tall giraffe"],
        "correct_index": 0
    })
}

fn sorting(id: &str) -> Value {
    json!({
        "id": id,
        "skill": "Vocabulary",
        "difficulty": 0.6,
        "mechanic": "audio-category-sorting",
        "categories": ["animals", "food"],
        "items": [
            {"id": "s1", "text": "dog", "category": "animals"},
            {"id": "s2", "text": "cat", "category": "animals"},
            {"id": "s3", "text": "bread", "category": "food"},
            {"id": "s4", "text": "milk", "category": "food"}
        ]
    })
}

fn isc(id: &str, skill: &str) -> Value {
    json!({
        "id": id,
        "skill": skill,
        "difficulty": 0.4,
        "mechanic": "image-single-choice-from-texts",
        "image_description": "a red apple on a table",
        "options": ["apple", "banana", "carrot"],
        "correct_index": 0
    })
}

fn mct(id: &str, skill: &str) -> Value {
    json!({
        "id": id,
        "skill": skill,
        "difficulty": 0.5,
        "mechanic": "multiple-choice-text-text",
        "prompt": "She ___ to school every day.",
        "options": ["goes", "go", "going"],
        "correct_index": 0
    })
}

fn scramble(id: &str) -> Value {
    json!({
        "id": id,
        "skill": "Grammar",
        "difficulty": 0.7,
        "mechanic": "sentence-scramble",
        "scrambled_words": ["school", "I", "to", "walk"],
        "correct_order": [1, 3, 2, 0]
    })
}

/// A bank with enough depth and category variety at every level that a full
/// fifteen-question session never starves a gate.
pub fn rich_bank() -> Arc<QuestionBank> {
    let mut levels = serde_json::Map::new();

    // Level 0: pronunciation only (curriculum floor)
    let l0: Vec<Value> = (0..6)
        .map(|i| {
            let skill = if i % 2 == 0 { "Pronunciation" } else { "Speaking" };
            wpp(&format!("l0-wpp-{i}"), skill)
        })
        .collect();
    levels.insert("0".to_string(), json!(l0));

    // Level 1: pronunciation + the two single-choice mechanics
    let mut l1 = Vec::new();
    for i in 0..2 {
        l1.push(wpp(&format!("l1-wpp-{i}"), "Pronunciation"));
    }
    for i in 0..2 {
        l1.push(ascfi(&format!("l1-ascfi-{i}")));
    }
    for i in 0..5 {
        let skill = if i % 2 == 0 { "Vocabulary" } else { "Reading" };
        l1.push(isc(&format!("l1-isc-{i}"), skill));
    }
    levels.insert("1".to_string(), json!(l1));

    // Levels 2-5: full mechanic set, four audio-side and four text-side each
    for lv in 2..=5 {
        let mut bucket = Vec::new();
        bucket.push(wpp(&format!("l{lv}-wpp-0"), "Pronunciation"));
        bucket.push(spp(&format!("l{lv}-spp-0")));
        bucket.push(ascfi(&format!("l{lv}-ascfi-0")));
        bucket.push(sorting(&format!("l{lv}-sort-0")));
        bucket.push(mct(&format!("l{lv}-mct-0"), "Grammar"));
        bucket.push(mct(&format!("l{lv}-mct-1"), "Vocabulary"));
        bucket.push(isc(&format!("l{lv}-isc-0"), "Reading"));
        bucket.push(scramble(&format!("l{lv}-scr-0")));
        if lv == 5 {
            bucket.push(spp("l5-spp-1"));
            bucket.push(mct("l5-mct-2", "Grammar"));
        }
        levels.insert(lv.to_string(), json!(bucket));
    }

    Arc::new(QuestionBank::from_value(Value::Object(levels)).expect("fixture bank is valid"))
}

/// The answer a perfectly performing student would give.
pub use placement_core::answer_key as correct_answer;

/// A decisively wrong answer for the same question.
pub fn wrong_answer(question: &Question) -> AnswerInput {
    match &question.payload {
        MechanicPayload::WordPronunciationPractice { .. }
        | MechanicPayload::SentencePronunciationPractice { .. } => AnswerInput::SelfAssessment {
            value: SelfAssessment::TryAgain,
        },
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
        } => AnswerInput::OptionIndex {
            value: (correct_index + 1) % options.len(),
        },
        MechanicPayload::SentenceScramble { correct_order, .. } => {
            let mut values = correct_order.clone();
            values.rotate_left(1);
            AnswerInput::Ordering { values }
        }
        MechanicPayload::AudioCategorySorting {
            categories, items, ..
        } => {
            let mut placements: HashMap<String, Vec<String>> = HashMap::new();
            for item in items {
                let wrong = categories
                    .iter()
                    .find(|c| **c != item.category)
                    .expect("fixture sorting questions have two categories");
                placements
                    .entry(wrong.clone())
                    .or_default()
                    .push(item.id.clone());
            }
            AnswerInput::Sort { placements }
        }
    }
}
