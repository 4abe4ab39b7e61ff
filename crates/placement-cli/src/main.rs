use anyhow::Result;
use clap::{Parser, Subcommand};

mod bank;
mod simulate;

/// Placement CLI - Development and testing tool for the adaptive placement engine
#[derive(Parser)]
#[command(name = "placement")]
#[command(about = "Drive simulated placement test sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full simulated session against a scripted student
    Simulate {
        /// Path to the question bank JSON file
        #[arg(long, default_value = "data/sample_bank.json")]
        bank: String,

        /// Student profile: perfect, hopeless, oscillating, or skill:<p>
        /// where p is the per-question success probability
        #[arg(long, default_value = "skill:0.75")]
        profile: String,

        /// Seed for both selection and the scripted student
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Validate a question bank and print its composition
    Bank {
        /// Path to the question bank JSON file
        #[arg(long, default_value = "data/sample_bank.json")]
        bank: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            bank,
            profile,
            seed,
        } => {
            simulate::run(&bank, &profile, seed).await?;
        }
        Commands::Bank { bank: path } => {
            bank::run(&path)?;
        }
    }

    Ok(())
}
