// ============================================================
// Layer 5 — Training Loops
// ============================================================
// One epoch loop per model family, both with the same skeleton:
//
//   for each epoch:
//     train: forward → loss → backward → Adam step (scheduled lr)
//     validate on the inner backend (model.valid(), no autodiff)
//     append a metrics row, save a checkpoint
//
// The loops are generic over the autodiff backend so the CLI can
// run them on the GPU while the regression tests drive the same
// code on the CPU backend.
//
//   m = β1·m + (1-β1)·g       (mean)
//   v = β2·v + (1-β2)·g²      (variance)
//   θ = θ - lr·m / (√v + ε)   (update)

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::{SentimentBatcher, SequenceBatcher};
use crate::data::{SentimentSample, SequenceSample};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::model::network::{Metaformer, SentimentClassifier};
use crate::training::schedule::LearningRateSchedule;
use crate::training::TrainSettings;

const ADAM_EPSILON: f32 = 1e-8;

// ─── Sequence tasks (sorting, next-token) ─────────────────────────────────────

/// Train a generative stack with per-position cross-entropy.
/// Returns the trained model for further evaluation.
pub fn fit_sequence_model<B: AutodiffBackend>(
    mut model: Metaformer<B>,
    settings: &TrainSettings,
    schedule: &LearningRateSchedule,
    train_dataset: impl Dataset<SequenceSample> + 'static,
    val_dataset: impl Dataset<SequenceSample> + 'static,
    checkpoints: &CheckpointManager,
    metrics: &MetricsLogger,
    device: B::Device,
) -> Result<Metaformer<B>> {
    B::seed(settings.seed);

    let mut optim = AdamConfig::new().with_epsilon(ADAM_EPSILON).init();

    let train_loader = DataLoaderBuilder::new(SequenceBatcher::<B>::new(device.clone()))
        .batch_size(settings.batch_size)
        .shuffle(settings.seed)
        .num_workers(1)
        .build(train_dataset);

    // Validation runs without autodiff overhead on the inner backend.
    let val_loader =
        DataLoaderBuilder::new(SequenceBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(settings.batch_size)
            .num_workers(1)
            .build(val_dataset);

    let mut step = 0usize;
    let mut rate = schedule.rate(1);

    for epoch in 1..=settings.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches = 0usize;

        for batch in train_loader.iter() {
            step += 1;
            rate = schedule.rate(step);

            let logits_bwt = model.forward(batch.input_ids)?;
            let [batch_size, words, tokens] = logits_bwt.dims();
            let loss = CrossEntropyLossConfig::new()
                .init(&logits_bwt.device())
                .forward(
                    logits_bwt.reshape([batch_size * words, tokens]),
                    batch.target_ids.reshape([batch_size * words]),
                );

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(rate, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else {
            f64::NAN
        };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches = 0usize;
        let mut correct_positions = 0usize;
        let mut total_positions = 0usize;

        for batch in val_loader.iter() {
            let logits_bwt = model_valid.forward(batch.input_ids)?;
            let [batch_size, words, tokens] = logits_bwt.dims();

            let flat_targets = batch.target_ids.reshape([batch_size * words]);
            let loss = CrossEntropyLossConfig::new()
                .init(&logits_bwt.device())
                .forward(
                    logits_bwt.clone().reshape([batch_size * words, tokens]),
                    flat_targets.clone(),
                );
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches += 1;

            let predictions = logits_bwt.argmax(2).reshape([batch_size * words]);
            let matched: i64 = predictions
                .equal(flat_targets)
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct_positions += matched as usize;
            total_positions += batch_size * words;
        }

        let avg_val_loss = if val_batches > 0 {
            val_loss_sum / val_batches as f64
        } else {
            f64::NAN
        };
        let accuracy = if total_positions > 0 {
            correct_positions as f64 / total_positions as f64
        } else {
            0.0
        };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | position_acc={:.1}% | lr={:.2e}",
            epoch,
            settings.epochs,
            avg_train_loss,
            avg_val_loss,
            accuracy * 100.0,
            rate,
        );

        metrics.log(&EpochMetrics {
            epoch,
            train_loss: avg_train_loss,
            val_loss: avg_val_loss,
            accuracy,
            lr: rate,
        })?;
        checkpoints.save_model(model.clone(), epoch)?;
    }

    tracing::info!("Training complete after {} steps", step);
    Ok(model)
}

/// Fraction of positions whose argmax matches the target, over a whole
/// dataset in one batch. Used for held-out evaluation after training.
pub fn sequence_accuracy<B: Backend>(
    model: &Metaformer<B>,
    dataset: &impl Dataset<SequenceSample>,
    device: &B::Device,
) -> Result<f64> {
    let items: Vec<SequenceSample> = (0..dataset.len()).filter_map(|i| dataset.get(i)).collect();
    if items.is_empty() {
        return Ok(0.0);
    }

    use burn::data::dataloader::batcher::Batcher;
    let batch = SequenceBatcher::<B>::new(device.clone()).batch(items);

    let logits_bwt = model.forward(batch.input_ids)?;
    let [batch_size, words, _] = logits_bwt.dims();

    let predictions = logits_bwt.argmax(2).reshape([batch_size * words]);
    let targets = batch.target_ids.reshape([batch_size * words]);
    let matched: i64 = predictions.equal(targets).int().sum().into_scalar().elem();

    Ok(matched as f64 / (batch_size * words) as f64)
}

// ─── Classification task (sentiment) ──────────────────────────────────────────

/// Train the classifier with sequence-level cross-entropy.
pub fn fit_classifier<B: AutodiffBackend>(
    mut model: SentimentClassifier<B>,
    settings: &TrainSettings,
    schedule: &LearningRateSchedule,
    train_dataset: impl Dataset<SentimentSample> + 'static,
    val_dataset: impl Dataset<SentimentSample> + 'static,
    checkpoints: &CheckpointManager,
    metrics: &MetricsLogger,
    device: B::Device,
) -> Result<SentimentClassifier<B>> {
    B::seed(settings.seed);

    let mut optim = AdamConfig::new().with_epsilon(ADAM_EPSILON).init();

    let train_loader = DataLoaderBuilder::new(SentimentBatcher::<B>::new(device.clone()))
        .batch_size(settings.batch_size)
        .shuffle(settings.seed)
        .num_workers(1)
        .build(train_dataset);

    let val_loader =
        DataLoaderBuilder::new(SentimentBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(settings.batch_size)
            .num_workers(1)
            .build(val_dataset);

    let mut step = 0usize;
    let mut rate = schedule.rate(1);

    for epoch in 1..=settings.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches = 0usize;

        for batch in train_loader.iter() {
            step += 1;
            rate = schedule.rate(step);

            let logits_bn = model.forward(batch.input_ids)?;
            let loss = CrossEntropyLossConfig::new()
                .init(&logits_bn.device())
                .forward(logits_bn, batch.labels);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(rate, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else {
            f64::NAN
        };

        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches = 0usize;
        let mut correct = 0usize;
        let mut total = 0usize;

        for batch in val_loader.iter() {
            let logits_bn = model_valid.forward(batch.input_ids)?;
            let batch_size = logits_bn.dims()[0];

            let loss = CrossEntropyLossConfig::new()
                .init(&logits_bn.device())
                .forward(logits_bn.clone(), batch.labels.clone());
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches += 1;

            let predictions = logits_bn.argmax(1).reshape([batch_size]);
            let matched: i64 = predictions
                .equal(batch.labels)
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += matched as usize;
            total += batch_size;
        }

        let avg_val_loss = if val_batches > 0 {
            val_loss_sum / val_batches as f64
        } else {
            f64::NAN
        };
        let accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | label_acc={:.1}% | lr={:.2e}",
            epoch,
            settings.epochs,
            avg_train_loss,
            avg_val_loss,
            accuracy * 100.0,
            rate,
        );

        metrics.log(&EpochMetrics {
            epoch,
            train_loss: avg_train_loss,
            val_loss: avg_val_loss,
            accuracy,
            lr: rate,
        })?;
        checkpoints.save_model(model.clone(), epoch)?;
    }

    tracing::info!("Training complete after {} steps", step);
    Ok(model)
}

// ─── Regression Tests ─────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sorting::SortingDataset;
    use crate::model::factory::ModelFactory;

    type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    // Statistical property, not an exactness check: a small decoder
    // trained on the sorting task should beat chance (1/3 per
    // position) by a wide margin on held-out sequences. Slow on the
    // CPU backend, hence ignored by default:
    //   cargo test --release -- --ignored
    #[test]
    #[ignore = "several minutes of CPU training"]
    fn test_trained_decoder_sorts_held_out_sequences() {
        let device = Default::default();
        let factory = ModelFactory::new(9, 3, 11, 2, 3);
        let model = factory.init_stack::<TrainBackend>(&device).unwrap();

        let settings = TrainSettings {
            checkpoint_dir: std::env::temp_dir()
                .join("metaformer-sorting-regression")
                .to_string_lossy()
                .into_owned(),
            epochs: 6,
            batch_size: 64,
            learning_rate: 1e-3,
            warmup_steps: 0,
            ..TrainSettings::default()
        };
        let schedule = LearningRateSchedule::new(&settings, factory.coordinates);
        let checkpoints = CheckpointManager::new(&settings.checkpoint_dir);
        let metrics = MetricsLogger::new(&settings.checkpoint_dir).unwrap();

        let train = SortingDataset::generate(2048, 11, 3, 7);
        let val = SortingDataset::generate(256, 11, 3, 8);

        let model = fit_sequence_model(
            model, &settings, &schedule, train, val, &checkpoints, &metrics, device,
        )
        .unwrap();

        // Held-out sequences from a seed the training never saw.
        let held_out = SortingDataset::generate(256, 11, 3, 9);
        let accuracy =
            sequence_accuracy(&model.valid(), &held_out, &Default::default()).unwrap();
        assert!(
            accuracy > 0.6,
            "per-position accuracy {accuracy:.3} did not clear chance by enough"
        );
    }
}
