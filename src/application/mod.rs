// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per training task, each orchestrating the same
// pipeline with its own data source:
//
//   train_sorting.rs   — synthetic sorting data → decoder stack
//   train_generator.rs — text corpus → decoder stack
//   train_sentiment.rs — labelled reviews → classifier
//
// This layer coordinates; it never computes. Data preparation
// lives in Layer 4, the model and training loops in Layer 5,
// persistence in Layer 6.

/// Sorting task: learn to emit the sorted permutation
pub mod train_sorting;

/// Next-token task: learn a text corpus autoregressively
pub mod train_generator;

/// Sentiment task: 5-way review classification
pub mod train_sentiment;

/// The backend the CLI trains on. Tests drive the same generic
/// training code on the CPU backend instead.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

pub fn train_device() -> burn::backend::wgpu::WgpuDevice {
    burn::backend::wgpu::WgpuDevice::default()
}
