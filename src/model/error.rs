// ============================================================
// Layer 5 — Model Error Taxonomy
// ============================================================
// Typed failures for the model core. Three families:
//
//   InvalidConfiguration — rejected hyperparameter combination,
//                          raised before any tensor is allocated
//   TokenOutOfRange /
//   SequenceTooLong      — bad input data, raised at the model
//                          boundary on the offending forward call
//   Unsupported          — an introspection call that is only
//                          meaningful for one attention variant
//
// Everything propagates synchronously to the caller; the model
// never retries and never falls back silently. The outer layers
// wrap these in anyhow for reporting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Rejected hyperparameter set. Checked at factory time,
    /// before any tensor is allocated.
    #[error("invalid model configuration: {0}")]
    InvalidConfiguration(String),

    /// A token id outside `[0, tokens)` reached the embedding table.
    #[error("token id {id} is outside the vocabulary range 0..{tokens}")]
    TokenOutOfRange { id: i64, tokens: usize },

    /// The input sequence is longer than the configured context window.
    #[error("sequence of length {got} exceeds the context window of {words} words")]
    SequenceTooLong { got: usize, words: usize },

    /// Operation that only one attention variant implements.
    #[error("{0} is only available for metric attention")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let e = ModelError::TokenOutOfRange { id: 12, tokens: 10 };
        assert!(e.to_string().contains("12"));
        assert!(e.to_string().contains("10"));

        let e = ModelError::SequenceTooLong { got: 7, words: 4 };
        assert!(e.to_string().contains('7'));
        assert!(e.to_string().contains('4'));
    }
}
