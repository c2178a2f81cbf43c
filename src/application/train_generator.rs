// ============================================================
// Layer 2 — Generator Training Use Case
// ============================================================
// Next-token prediction over a plain-text corpus with a
// decoder-only stack:
//
//   Step 1: read the corpus file
//   Step 2: build or load the word-level tokenizer
//   Step 3: encode the corpus into one id stream
//   Step 4: split the stream, window it into samples
//   Step 5: assemble the model, save configs
//   Step 6: run the training loop

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::{train_device, TrainBackend};
use crate::data::corpus::CorpusDataset;
use crate::infra::{
    checkpoint::CheckpointManager, metrics::MetricsLogger, tokenizer_store::TokenizerStore,
};
use crate::model::factory::ModelFactory;
use crate::training::schedule::LearningRateSchedule;
use crate::training::trainer::fit_sequence_model;
use crate::training::TrainSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub model: ModelFactory,
    pub settings: TrainSettings,
    pub corpus_path: String,
}

pub struct GeneratorUseCase {
    config: GeneratorConfig,
}

impl GeneratorUseCase {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let model_params = &self.config.model;
        let settings = &self.config.settings;

        // ── Step 1: corpus ────────────────────────────────────────────────────
        let corpus = std::fs::read_to_string(&self.config.corpus_path)
            .with_context(|| format!("Cannot read corpus '{}'", self.config.corpus_path))?;
        tracing::info!(
            "Read {} characters from '{}'",
            corpus.len(),
            self.config.corpus_path
        );

        // ── Step 2: tokenizer (vocabulary size = the model's `tokens`) ────────
        let store = TokenizerStore::new(&settings.checkpoint_dir);
        let tokenizer = store.load_or_build(std::slice::from_ref(&corpus), model_params.tokens)?;

        // ── Step 3: one id stream for the whole corpus ────────────────────────
        let encoding = tokenizer
            .encode(corpus.as_str(), false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        let ids: Vec<u32> = encoding.get_ids().to_vec();
        tracing::info!("Corpus is {} tokens long", ids.len());

        if ids.len() <= model_params.words + 1 {
            bail!(
                "corpus of {} tokens is too short for a context window of {} words",
                ids.len(),
                model_params.words
            );
        }

        // ── Step 4: split the stream, then window each side ───────────────────
        // Splitting the raw stream (not the windows) keeps validation
        // text the model has never overlapped during training.
        let cut = ((ids.len() as f64) * settings.train_fraction).round() as usize;
        let cut = cut.min(ids.len());
        let train = CorpusDataset::new(ids[..cut].to_vec(), model_params.words);
        let val = CorpusDataset::new(ids[cut..].to_vec(), model_params.words);

        // ── Step 5: model and run record ──────────────────────────────────────
        let device = train_device();
        let model = model_params.init_stack::<TrainBackend>(&device)?;

        let checkpoints = CheckpointManager::new(&settings.checkpoint_dir);
        checkpoints.save_config("model_config.json", model_params)?;
        checkpoints.save_config("train_config.json", settings)?;
        let metrics = MetricsLogger::new(&settings.checkpoint_dir)?;

        // ── Step 6: train ─────────────────────────────────────────────────────
        let schedule = LearningRateSchedule::new(settings, model_params.coordinates);
        fit_sequence_model(
            model, settings, &schedule, train, val, &checkpoints, &metrics, device,
        )?;

        Ok(())
    }
}
