// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Four subcommands: the three training tasks plus a dry-run
// parameter estimate. Each Args struct carries its own defaults
// tuned for that task, and converts into the application-layer
// config via From, so the lower layers never see clap types.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_generator::GeneratorConfig;
use crate::application::train_sentiment::SentimentConfig;
use crate::application::train_sorting::SortingConfig;
use crate::model::attention::AttentionKind;
use crate::model::factory::ModelFactory;
use crate::training::TrainSettings;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a decoder to sort short token sequences (synthetic data)
    Sort(SortArgs),

    /// Train a next-token model on a plain-text corpus
    Generate(GenerateArgs),

    /// Train a 5-way sentiment classifier on JSONL reviews
    Sentiment(SentimentArgs),

    /// Print the estimated parameter count for a configuration
    Estimate(EstimateArgs),
}

/// CLI-facing attention selector.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AttentionArg {
    /// Standard Q·Kᵀ scoring
    ScaledDotProduct,
    /// Learned symmetric bilinear form
    Metric,
}

impl From<AttentionArg> for AttentionKind {
    fn from(arg: AttentionArg) -> Self {
        match arg {
            AttentionArg::ScaledDotProduct => AttentionKind::ScaledDotProduct,
            AttentionArg::Metric => AttentionKind::Metric,
        }
    }
}

// ─── sort ─────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct SortArgs {
    /// Embedding width (must divide evenly by --heads)
    #[arg(long, default_value_t = 9)]
    pub coordinates: usize,

    /// Number of attention heads per block
    #[arg(long, default_value_t = 3)]
    pub heads: usize,

    /// Number of transformer blocks
    #[arg(long, default_value_t = 3)]
    pub blocks: usize,

    /// Sequence length to sort
    #[arg(long, default_value_t = 11)]
    pub words: usize,

    /// Alphabet size of the sequences
    #[arg(long, default_value_t = 3)]
    pub tokens: usize,

    #[arg(long, value_enum, default_value = "scaled-dot-product")]
    pub attention: AttentionArg,

    /// Use bias terms in the linear projections
    #[arg(long)]
    pub bias: bool,

    /// Training samples generated per run
    #[arg(long, default_value_t = 8192)]
    pub train_samples: usize,

    /// Validation (and held-out) samples
    #[arg(long, default_value_t = 1024)]
    pub val_samples: usize,

    #[command(flatten)]
    pub train: CommonTrainArgs,
}

impl From<SortArgs> for SortingConfig {
    fn from(a: SortArgs) -> Self {
        SortingConfig {
            model: ModelFactory::new(a.coordinates, a.tokens, a.words, a.blocks, a.heads)
                .with_bias(a.bias)
                .with_attention(a.attention.into()),
            settings: a.train.into_settings("checkpoints/sort"),
            train_samples: a.train_samples,
            val_samples: a.val_samples,
        }
    }
}

// ─── generate ─────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Plain-text corpus to learn from
    #[arg(long)]
    pub corpus: String,

    #[arg(long, default_value_t = 256)]
    pub coordinates: usize,

    #[arg(long, default_value_t = 8)]
    pub heads: usize,

    #[arg(long, default_value_t = 6)]
    pub blocks: usize,

    /// Context window in tokens
    #[arg(long, default_value_t = 128)]
    pub words: usize,

    /// Vocabulary size the tokenizer builds towards
    #[arg(long, default_value_t = 8192)]
    pub tokens: usize,

    #[arg(long, value_enum, default_value = "scaled-dot-product")]
    pub attention: AttentionArg,

    #[arg(long)]
    pub bias: bool,

    #[command(flatten)]
    pub train: CommonTrainArgs,
}

impl From<GenerateArgs> for GeneratorConfig {
    fn from(a: GenerateArgs) -> Self {
        GeneratorConfig {
            model: ModelFactory::new(a.coordinates, a.tokens, a.words, a.blocks, a.heads)
                .with_bias(a.bias)
                .with_attention(a.attention.into()),
            settings: a.train.into_settings("checkpoints/generate"),
            corpus_path: a.corpus,
        }
    }
}

// ─── sentiment ────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct SentimentArgs {
    /// JSONL file: one {"rating": 1..=5, "text": "..."} per line
    #[arg(long)]
    pub data: String,

    #[arg(long, default_value_t = 128)]
    pub coordinates: usize,

    #[arg(long, default_value_t = 8)]
    pub heads: usize,

    #[arg(long, default_value_t = 4)]
    pub blocks: usize,

    /// Reviews are truncated or padded to this many tokens
    #[arg(long, default_value_t = 96)]
    pub words: usize,

    #[arg(long, default_value_t = 8192)]
    pub tokens: usize,

    #[arg(long, value_enum, default_value = "scaled-dot-product")]
    pub attention: AttentionArg,

    #[arg(long)]
    pub bias: bool,

    #[command(flatten)]
    pub train: CommonTrainArgs,
}

impl From<SentimentArgs> for SentimentConfig {
    fn from(a: SentimentArgs) -> Self {
        SentimentConfig {
            model: ModelFactory::new(a.coordinates, a.tokens, a.words, a.blocks, a.heads)
                .with_bias(a.bias)
                .with_attention(a.attention.into()),
            settings: a.train.into_settings("checkpoints/sentiment"),
            data_path: a.data,
        }
    }
}

// ─── estimate ─────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct EstimateArgs {
    #[arg(long)]
    pub coordinates: usize,

    #[arg(long)]
    pub heads: usize,

    #[arg(long)]
    pub blocks: usize,

    #[arg(long)]
    pub words: usize,

    #[arg(long)]
    pub tokens: usize,
}

impl From<&EstimateArgs> for ModelFactory {
    fn from(a: &EstimateArgs) -> Self {
        ModelFactory::new(a.coordinates, a.tokens, a.words, a.blocks, a.heads)
    }
}

// ─── shared training flags ────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct CommonTrainArgs {
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Fixed learning rate (ignored when --warmup-steps > 0)
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Warmup steps for the inverse-sqrt schedule; 0 = fixed rate
    #[arg(long, default_value_t = 0)]
    pub warmup_steps: usize,

    /// Multiplier on the scheduled rate
    #[arg(long, default_value_t = 1.0)]
    pub schedule_scaling: f64,

    /// Fraction of the data used for training (rest validates)
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Where checkpoints, configs, and metrics land
    #[arg(long)]
    pub checkpoint_dir: Option<String>,
}

impl CommonTrainArgs {
    pub fn into_settings(self, default_dir: &str) -> TrainSettings {
        TrainSettings {
            checkpoint_dir: self.checkpoint_dir.unwrap_or_else(|| default_dir.to_string()),
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.lr,
            warmup_steps: self.warmup_steps,
            schedule_scaling: self.schedule_scaling,
            train_fraction: self.train_fraction,
            seed: self.seed,
        }
    }
}
