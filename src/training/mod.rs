// ============================================================
// Layer 5 — Training Harness
// ============================================================
// The outer loop around the model: Adam stepping, warmup
// learning-rate schedule, per-epoch validation, checkpointing
// and metrics. The model layer never sees any of this; it only
// receives forward calls and parameter updates.
//
//   schedule.rs — warmup-then-decay learning-rate schedule
//   trainer.rs  — epoch loops for the sequence and
//                 classification tasks
//
// Reference: Burn Book §5 (Training)
//            Kingma & Ba (2015) Adam
//            Vaswani et al. (2017) §5.3 (warmup schedule)

pub mod schedule;
pub mod trainer;

use serde::{Deserialize, Serialize};

/// Hyperparameters of a training run (as opposed to the model's own
/// hyperparameters). Built once from CLI arguments and saved to the
/// checkpoint directory so the run is reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSettings {
    pub checkpoint_dir: String,
    pub epochs: usize,
    pub batch_size: usize,
    /// Fixed learning rate, used when `warmup_steps` is zero.
    pub learning_rate: f64,
    /// Steps of linear warmup before the inverse-sqrt decay.
    /// Zero disables the schedule entirely.
    pub warmup_steps: usize,
    /// Multiplier on the scheduled rate.
    pub schedule_scaling: f64,
    /// Portion of the data kept for training; the rest validates.
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-3,
            warmup_steps: 0,
            schedule_scaling: 1.0,
            train_fraction: 0.8,
            seed: 1,
        }
    }
}
