use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use placement_core::{
    answer_key, AnswerInput, EngineConfig, MechanicPayload, PlacementEngine, Question,
    QuestionBank, SelfAssessment,
};

/// How the scripted student answers.
#[derive(Debug, Clone, Copy)]
enum StudentProfile {
    /// Every answer correct
    Perfect,
    /// Every answer wrong
    Hopeless,
    /// Alternating correct/incorrect, starting correct
    Oscillating,
    /// Correct with a fixed probability
    Skilled(f64),
}

impl StudentProfile {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "perfect" => Ok(Self::Perfect),
            "hopeless" => Ok(Self::Hopeless),
            "oscillating" => Ok(Self::Oscillating),
            other => {
                if let Some(p) = other.strip_prefix("skill:") {
                    let p: f64 = p
                        .parse()
                        .with_context(|| format!("invalid skill probability: {p}"))?;
                    if !(0.0..=1.0).contains(&p) {
                        bail!("skill probability {p} must be within 0.0-1.0");
                    }
                    return Ok(Self::Skilled(p));
                }
                bail!("unknown profile '{other}'; use perfect, hopeless, oscillating or skill:<p>")
            }
        }
    }

    fn answers_correctly(&self, index: usize, rng: &mut StdRng) -> bool {
        match self {
            Self::Perfect => true,
            Self::Hopeless => false,
            Self::Oscillating => index % 2 == 0,
            Self::Skilled(p) => rng.gen_bool(*p),
        }
    }
}

/// A decisively wrong answer for any question.
fn wrong_answer(question: &Question) -> AnswerInput {
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
                if let Some(wrong) = categories.iter().find(|c| **c != item.category) {
                    placements
                        .entry(wrong.clone())
                        .or_default()
                        .push(item.id.clone());
                }
            }
            AnswerInput::Sort { placements }
        }
    }
}

/// Run one simulated session end to end and print the final report.
pub async fn run(bank_path: &str, profile: &str, seed: u64) -> Result<()> {
    let profile = StudentProfile::parse(profile)?;
    let raw = std::fs::read_to_string(bank_path)
        .with_context(|| format!("failed to read bank file {bank_path}"))?;
    let bank = Arc::new(QuestionBank::from_json_str(&raw)?);

    println!(
        "🎓 {}",
        format!("Simulating placement test ({profile:?}, seed {seed})")
            .bright_cyan()
            .bold()
    );
    println!(
        "   {}: {} questions across 6 levels",
        "Bank".dimmed(),
        bank.total_questions()
    );
    println!();

    let mut engine = PlacementEngine::with_seed(bank, EngineConfig::default(), seed);
    // Separate stream so student behavior never perturbs selection
    let mut student_rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    let mut index = 0usize;
    while let Some(served) = engine.next_question()? {
        let correct = profile.answers_correctly(index, &mut student_rng);
        let answer = if correct {
            answer_key(&served.question)
        } else {
            wrong_answer(&served.question)
        };
        let response_time = student_rng.gen_range(1.5..9.0);
        let record = engine.submit_answer(&served.question.id, &answer, response_time)?;

        let outcome = if record.correct {
            "✓".green()
        } else {
            "✗".red()
        };
        let phase = if served.is_calibration { "cal" } else { "adp" };
        println!(
            "   Q{:>2} [{}] L{} {:<34} {}  → estimate L{} (momentum {:+.1})",
            index + 1,
            phase.dimmed(),
            served.assigned_level,
            served.question.mechanic().to_string(),
            outcome,
            engine.state().current_level,
            engine.state().momentum,
        );
        index += 1;
    }

    if engine.ended_early() {
        println!();
        println!(
            "⚠️  {}",
            "Question pool exhausted before the full test length".yellow()
        );
    }

    let report = engine.finish().await?;
    println!();
    println!(
        "🏁 {}",
        format!(
            "Placed at Novakid Level {} ({}) with confidence {:.2}",
            report.placement.novakid_level,
            report.placement.cefr_equivalent,
            report.placement.confidence
        )
        .bright_green()
        .bold()
    );
    println!();
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
