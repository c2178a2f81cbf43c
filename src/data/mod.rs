// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw task data and GPU-ready tensor batches.
//
// Three sources feed one of two sample shapes:
//
//   sorting.rs    → synthetic (sequence, sorted sequence) pairs
//   corpus.rs     → sliding windows over a tokenised text
//                       both yield SequenceSample
//   sentiment.rs  → labelled review texts
//                       yields SentimentSample
//
//   batcher.rs    → stacks either sample shape into tensors
//   splitter.rs   → shuffles and splits into train/validation
//
// Each module does exactly one step, so each step is testable
// without touching the model layer.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Synthetic sorting-task dataset
pub mod sorting;

/// Sliding windows over a tokenised corpus for next-token training
pub mod corpus;

/// Labelled sentiment records and their dataset
pub mod sentiment;

/// Burn Batcher implementations for both sample shapes
pub mod batcher;

/// Shuffled train/validation splitting
pub mod splitter;

use serde::{Deserialize, Serialize};

/// One training example for the sequence-to-sequence tasks: the model
/// reads `input_ids` and is scored against `target_ids` per position.
/// Both have the same length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceSample {
    pub input_ids: Vec<u32>,
    pub target_ids: Vec<u32>,
}

/// One training example for the classification task: a tokenised,
/// padded text and its class label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSample {
    pub input_ids: Vec<u32>,
    pub label: usize,
}
