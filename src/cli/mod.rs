// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// This layer only routes; every command body is one conversion
// plus one call into Layer 2.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EstimateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "metaformer",
    version,
    about = "Train small transformer models with scaled dot-product or learned-metric attention."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Sort(args) => {
                use crate::application::train_sorting::SortingUseCase;
                SortingUseCase::new(args.into()).execute()
            }
            Commands::Generate(args) => {
                use crate::application::train_generator::GeneratorUseCase;
                GeneratorUseCase::new(args.into()).execute()
            }
            Commands::Sentiment(args) => {
                use crate::application::train_sentiment::SentimentUseCase;
                SentimentUseCase::new(args.into()).execute()
            }
            Commands::Estimate(args) => run_estimate(&args),
        }
    }
}

/// Pre-flight capacity check: validate the configuration and print
/// the rough parameter count without allocating anything.
fn run_estimate(args: &EstimateArgs) -> Result<()> {
    use crate::model::factory::ModelFactory;

    let factory = ModelFactory::from(args);
    factory.validate()?;

    let parameters = factory.estimate_model_size();
    let megabytes = (parameters * std::mem::size_of::<f32>()) as f64 / 1024.0 / 1024.0;
    println!("~{parameters} parameters ({megabytes:.1} MiB of f32 weights)");
    Ok(())
}
