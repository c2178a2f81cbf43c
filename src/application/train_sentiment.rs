// ============================================================
// Layer 2 — Sentiment Training Use Case
// ============================================================
// 5-way review classification with the pooled-head variant:
//
//   Step 1: load JSONL records (rating 1..=5 + text)
//   Step 2: build or load the tokenizer from the review texts
//   Step 3: tokenise, truncate/pad each review to `words`
//   Step 4: shuffle-split into train/validation
//   Step 5: assemble the classifier, save configs
//   Step 6: run the training loop

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::{train_device, TrainBackend};
use crate::data::sentiment::{load_records, SentimentDataset, NUMBER_OF_CLASSES};
use crate::data::splitter::split_train_val;
use crate::data::SentimentSample;
use crate::infra::{
    checkpoint::CheckpointManager, metrics::MetricsLogger, tokenizer_store::TokenizerStore,
};
use crate::infra::tokenizer_store::PAD_ID;
use crate::model::factory::ModelFactory;
use crate::training::schedule::LearningRateSchedule;
use crate::training::trainer::fit_classifier;
use crate::training::TrainSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    pub model: ModelFactory,
    pub settings: TrainSettings,
    pub data_path: String,
}

pub struct SentimentUseCase {
    config: SentimentConfig,
}

impl SentimentUseCase {
    pub fn new(config: SentimentConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let model_params = &self.config.model;
        let settings = &self.config.settings;

        // ── Step 1: records ───────────────────────────────────────────────────
        let records = load_records(&self.config.data_path)?;

        // ── Step 2: tokenizer over the review texts ───────────────────────────
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let store = TokenizerStore::new(&settings.checkpoint_dir);
        let tokenizer = store.load_or_build(&texts, model_params.tokens)?;

        // ── Step 3: fixed-length samples ──────────────────────────────────────
        let mut samples = Vec::with_capacity(records.len());
        for record in &records {
            let label = record.label()?;
            let encoding = tokenizer
                .encode(record.text.as_str(), false)
                .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
            let mut input_ids = encoding.get_ids().to_vec();
            input_ids.truncate(model_params.words);
            while input_ids.len() < model_params.words {
                input_ids.push(PAD_ID);
            }
            samples.push(SentimentSample { input_ids, label });
        }
        tracing::info!("Built {} sentiment samples", samples.len());

        // ── Step 4: split ─────────────────────────────────────────────────────
        let (train_samples, val_samples) = split_train_val(samples, settings.train_fraction);
        let train = SentimentDataset::new(train_samples);
        let val = SentimentDataset::new(val_samples);

        // ── Step 5: classifier and run record ─────────────────────────────────
        let device = train_device();
        let model =
            model_params.init_classifier::<TrainBackend>(NUMBER_OF_CLASSES, &device)?;

        let checkpoints = CheckpointManager::new(&settings.checkpoint_dir);
        checkpoints.save_config("model_config.json", model_params)?;
        checkpoints.save_config("train_config.json", settings)?;
        let metrics = MetricsLogger::new(&settings.checkpoint_dir)?;

        // ── Step 6: train ─────────────────────────────────────────────────────
        let schedule = LearningRateSchedule::new(settings, model_params.coordinates);
        fit_classifier(
            model, settings, &schedule, train, val, &checkpoints, &metrics, device,
        )?;

        Ok(())
    }
}
