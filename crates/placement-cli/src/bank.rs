use std::collections::BTreeMap;

use anyhow::{Context, Result};
use colored::*;

use placement_core::{NovakidLevel, QuestionBank};

/// Validate a bank file and print its composition per level and mechanic.
pub fn run(bank_path: &str) -> Result<()> {
    let raw = std::fs::read_to_string(bank_path)
        .with_context(|| format!("failed to read bank file {bank_path}"))?;
    let bank = QuestionBank::from_json_str(&raw)?;

    println!(
        "📚 {}",
        format!("{bank_path}: {} questions", bank.total_questions())
            .bright_cyan()
            .bold()
    );
    println!();

    for level in NovakidLevel::ALL {
        let questions = bank.questions_at(level);
        let mut by_mechanic: BTreeMap<&str, usize> = BTreeMap::new();
        let mut audio = 0usize;
        let mut text = 0usize;
        for question in questions {
            *by_mechanic.entry(question.mechanic().as_str()).or_default() += 1;
            match question.mechanic().balance_side() {
                placement_core::BalanceSide::Audio => audio += 1,
                placement_core::BalanceSide::Text => text += 1,
            }
        }

        println!(
            "   Level {} ({:<6}) {:>3} questions  {} audio / {} text",
            level,
            level.cefr_label(),
            questions.len(),
            audio,
            text
        );
        for (mechanic, count) in by_mechanic {
            println!("      {:<34} {}", mechanic.dimmed(), count);
        }
    }

    println!();
    println!("✅ {}", "Bank is valid".green());
    Ok(())
}
