// ============================================================
// Layer 2 — Sorting Training Use Case
// ============================================================
// The smallest end-to-end task: a decoder-only stack reads a
// random token sequence and must emit the same tokens sorted
// ascending, position by position. No files are involved; the
// data is generated, seeded, on the fly.
//
// Pipeline:
//   Step 1: generate train/validation/held-out datasets
//   Step 2: assemble the model from the hyperparameters
//   Step 3: save configs for the run record
//   Step 4: run the training loop
//   Step 5: report held-out per-position accuracy

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::{train_device, TrainBackend};
use crate::data::sorting::SortingDataset;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::model::factory::ModelFactory;
use crate::training::schedule::LearningRateSchedule;
use crate::training::trainer::{fit_sequence_model, sequence_accuracy};
use crate::training::TrainSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortingConfig {
    pub model: ModelFactory,
    pub settings: TrainSettings,
    pub train_samples: usize,
    pub val_samples: usize,
}

pub struct SortingUseCase {
    config: SortingConfig,
}

impl SortingUseCase {
    pub fn new(config: SortingConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let model_params = &self.config.model;
        let settings = &self.config.settings;

        tracing::info!(
            "Sorting task: words={}, tokens={}, ~{} parameters",
            model_params.words,
            model_params.tokens,
            model_params.estimate_model_size(),
        );

        // ── Datasets: disjoint seeds for train / val / held-out ───────────────
        let train = SortingDataset::generate(
            self.config.train_samples,
            model_params.words,
            model_params.tokens,
            settings.seed,
        );
        let val = SortingDataset::generate(
            self.config.val_samples,
            model_params.words,
            model_params.tokens,
            settings.seed + 1,
        );
        let held_out = SortingDataset::generate(
            self.config.val_samples,
            model_params.words,
            model_params.tokens,
            settings.seed + 2,
        );

        // ── Model and run record ──────────────────────────────────────────────
        let device = train_device();
        let model = model_params.init_stack::<TrainBackend>(&device)?;

        let checkpoints = CheckpointManager::new(&settings.checkpoint_dir);
        checkpoints.save_config("model_config.json", model_params)?;
        checkpoints.save_config("train_config.json", settings)?;
        let metrics = MetricsLogger::new(&settings.checkpoint_dir)?;

        // ── Train ─────────────────────────────────────────────────────────────
        let schedule = LearningRateSchedule::new(settings, model_params.coordinates);
        let model = fit_sequence_model(
            model, settings, &schedule, train, val, &checkpoints, &metrics, device,
        )?;

        // ── Held-out evaluation ───────────────────────────────────────────────
        use burn::module::AutodiffModule;
        let accuracy = sequence_accuracy(&model.valid(), &held_out, &train_device())?;
        tracing::info!("Held-out per-position accuracy: {:.3}", accuracy);
        println!("Held-out per-position accuracy: {:.1}%", accuracy * 100.0);

        Ok(())
    }
}
