// ============================================================
// Layer 4 — Batchers
// ============================================================
// Implements Burn's Batcher trait for both sample shapes: stack
// N equal-length samples into [N, words] id tensors (plus [N]
// labels for classification). All samples are padded to a fixed
// length upstream, so stacking is a flatten + reshape.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{SentimentSample, SequenceSample};

// ─── Sequence tasks ───────────────────────────────────────────────────────────

/// A batch for the sorting and next-token tasks.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// [batch, words] input ids.
    pub input_ids: Tensor<B, 2, Int>,
    /// [batch, words] per-position target ids.
    pub target_ids: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

fn stack_ids<B: Backend>(
    rows: impl Iterator<Item = Vec<u32>>,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let mut flat: Vec<i32> = Vec::new();
    let mut count = 0usize;
    let mut width = 0usize;
    for row in rows {
        width = row.len();
        count += 1;
        flat.extend(row.into_iter().map(|id| id as i32));
    }
    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([count, width])
}

impl<B: Backend> Batcher<SequenceSample, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<SequenceSample>) -> SequenceBatch<B> {
        let input_ids =
            stack_ids::<B>(items.iter().map(|s| s.input_ids.clone()), &self.device);
        let target_ids =
            stack_ids::<B>(items.into_iter().map(|s| s.target_ids), &self.device);
        SequenceBatch { input_ids, target_ids }
    }
}

// ─── Classification task ──────────────────────────────────────────────────────

/// A batch for the sentiment task.
#[derive(Debug, Clone)]
pub struct SentimentBatch<B: Backend> {
    /// [batch, words] input ids.
    pub input_ids: Tensor<B, 2, Int>,
    /// [batch] class labels.
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SentimentBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SentimentBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SentimentSample, SentimentBatch<B>> for SentimentBatcher<B> {
    fn batch(&self, items: Vec<SentimentSample>) -> SentimentBatch<B> {
        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();
        let input_ids =
            stack_ids::<B>(items.into_iter().map(|s| s.input_ids), &self.device);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);
        SentimentBatch { input_ids, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_sequence_batch_shapes() {
        let batcher = SequenceBatcher::<TestBackend>::new(Default::default());
        let items = vec![
            SequenceSample { input_ids: vec![2, 0, 1], target_ids: vec![0, 1, 2] },
            SequenceSample { input_ids: vec![1, 1, 0], target_ids: vec![0, 1, 1] },
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.input_ids.dims(), [2, 3]);
        assert_eq!(batch.target_ids.dims(), [2, 3]);

        let targets = batch.target_ids.into_data().to_vec::<i64>().unwrap();
        assert_eq!(targets, vec![0, 1, 2, 0, 1, 1]);
    }

    #[test]
    fn test_sentiment_batch_shapes() {
        let batcher = SentimentBatcher::<TestBackend>::new(Default::default());
        let items = vec![
            SentimentSample { input_ids: vec![5, 6, 0, 0], label: 4 },
            SentimentSample { input_ids: vec![7, 8, 9, 2], label: 0 },
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2]);

        let labels = batch.labels.into_data().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![4, 0]);
    }
}
