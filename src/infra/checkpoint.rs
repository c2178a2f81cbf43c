// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's CompactRecorder
// (MessagePack + gzip), generically over any Module so the same
// manager serves all three topologies.
//
// Files per checkpoint directory:
//   model_epoch_{n}.mpk.gz — weights after epoch n
//   latest_epoch.json      — which epoch was last saved
//   model_config.json      — hyperparameters to rebuild the model
//   train_config.json      — training settings for the run record
//
// The configs are saved separately because loading weights needs
// a model of the exact architecture to load them into.

use anyhow::{Context, Result};
use burn::{
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::PathBuf};

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save model weights for a given epoch and move the latest-epoch
    /// pointer forward.
    pub fn save_model<B, M>(&self, model: M, epoch: usize) -> Result<()>
    where
        B: Backend,
        M: Module<B>,
    {
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        CompactRecorder::new()
            .record(model.into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest = self.dir.join("latest_epoch.json");
        fs::write(&latest, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint for epoch {}", epoch);
        Ok(())
    }

    /// Load the latest saved weights into `model`, which must have the
    /// architecture the checkpoint was written with.
    pub fn load_model<B, M>(&self, model: M, device: &B::Device) -> Result<M>
    where
        B: Backend,
        M: Module<B>,
    {
        let epoch = self.latest_epoch()?;
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Persist any serialisable config under the given file name.
    pub fn save_config<C: Serialize>(&self, name: &str, config: &C) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved config '{}'", path.display());
        Ok(())
    }

    pub fn load_config<C: DeserializeOwned>(&self, name: &str) -> Result<C> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let raw = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run a training task first?")?;
        Ok(serde_json::from_str::<usize>(&raw)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct DemoConfig {
        coordinates: usize,
        words: usize,
    }

    #[test]
    fn test_config_round_trip() {
        let dir = std::env::temp_dir().join("metaformer-checkpoint-test");
        let manager = CheckpointManager::new(&dir);

        let config = DemoConfig { coordinates: 8, words: 4 };
        manager.save_config("model_config.json", &config).unwrap();
        let loaded: DemoConfig = manager.load_config("model_config.json").unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_checkpoint_is_a_helpful_error() {
        let dir = std::env::temp_dir().join("metaformer-checkpoint-empty");
        let manager = CheckpointManager::new(&dir);
        let err = manager.latest_epoch().unwrap_err();
        assert!(err.to_string().contains("latest_epoch.json"));
    }

    #[test]
    fn test_model_weights_round_trip() {
        use crate::model::factory::ModelFactory;
        use burn::prelude::*;

        type TestBackend = burn::backend::NdArray;

        let dir = std::env::temp_dir().join(format!(
            "metaformer-checkpoint-roundtrip-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        let manager = CheckpointManager::new(&dir);

        let factory = ModelFactory::new(8, 10, 4, 1, 2);
        let device = Default::default();
        let trained = factory.init_stack::<TestBackend>(&device).unwrap();
        manager.save_model(trained.clone(), 3).unwrap();

        // Loading restores the saved weights into a fresh model: both
        // must then agree on every logit.
        let fresh = factory.init_stack::<TestBackend>(&device).unwrap();
        let restored = manager.load_model(fresh, &device).unwrap();

        let input = Tensor::<TestBackend, 1, Int>::from_ints(
            [1, 2, 3, 4].as_slice(),
            &device,
        )
        .reshape([1, 4]);

        let expected = trained.forward(input.clone()).unwrap().into_data();
        let restored = restored.forward(input).unwrap().into_data();
        expected.assert_approx_eq(&restored, 5);
    }
}
