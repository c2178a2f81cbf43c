// ============================================================
// Layer 5 — Model Layer (Burn)
// ============================================================
// All burn model code lives here; no other layer builds tensors
// for the network itself (batchers build input tensors only).
//
// What's in this layer:
//
//   factory.rs   — Hyperparameters, dimensional validation,
//                  parameter-count estimation, and assembly of
//                  the three topologies
//
//   encoder.rs   — Token + position embedding lookup with input
//                  bounds enforcement
//
//   attention.rs — The two self-attention variants behind one
//                  enum (scaled dot-product, learned metric),
//                  the shared causal mask, and cross attention
//
//   block.rs     — Pre-norm transformer block and the junction
//                  block used by the encoder-decoder topology
//
//   network.rs   — Assembled stacks: generative, encoder-decoder
//                  and the pooled classification variant
//
//   error.rs     — Typed failure taxonomy for the model core
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Radford et al. (2019) GPT-2

pub mod attention;
pub mod block;
pub mod encoder;
pub mod error;
pub mod factory;
pub mod network;
