// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns, shared by all three tasks:
//
//   checkpoint.rs      — Model weights via Burn's CompactRecorder,
//                        plus the JSON configs needed to rebuild
//                        the exact architecture later
//
//   metrics.rs         — Epoch-level training metrics appended to
//                        a CSV file in the checkpoint directory
//
//   tokenizer_store.rs — Word-level vocabulary persistence so the
//                        corpus and sentiment tasks tokenise the
//                        same way across runs
//
// Reference: Burn Book §5 (Records and Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;
