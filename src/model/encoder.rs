// ============================================================
// Layer 5 — Sequence Encoder
// ============================================================
// Turns integer token ids into embedding vectors: a learned
// token table (tokens, coordinates) plus a learned position
// table (words, coordinates), summed elementwise. Attention is
// permutation-invariant, so position must be injected here.
//
// Input bounds are enforced before the lookup: a sequence longer
// than the context window or an id outside the vocabulary is a
// typed error, not backend-dependent misbehaviour.

use burn::{
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::model::error::ModelError;
use crate::model::factory::ModelFactory;

#[derive(Module, Debug)]
pub struct SequenceEncoder<B: Backend> {
    pub token_embedding: Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub tokens: usize,
    pub words: usize,
}

impl<B: Backend> SequenceEncoder<B> {
    pub fn new(params: &ModelFactory, device: &B::Device) -> Self {
        Self {
            token_embedding: EmbeddingConfig::new(params.tokens, params.coordinates)
                .init(device),
            position_embedding: EmbeddingConfig::new(params.words, params.coordinates)
                .init(device),
            tokens: params.tokens,
            words: params.words,
        }
    }

    /// (batch, words) integer ids -> (batch, words, coordinates) floats.
    pub fn forward(
        &self,
        in_sequence_bw: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let [batch, words] = in_sequence_bw.dims();
        if words > self.words {
            return Err(ModelError::SequenceTooLong {
                got: words,
                words: self.words,
            });
        }

        // One device round-trip per bound; small models, cheap sync.
        let highest: i64 = in_sequence_bw.clone().max().into_scalar().elem();
        if highest >= self.tokens as i64 {
            return Err(ModelError::TokenOutOfRange {
                id: highest,
                tokens: self.tokens,
            });
        }
        let lowest: i64 = in_sequence_bw.clone().min().into_scalar().elem();
        if lowest < 0 {
            return Err(ModelError::TokenOutOfRange {
                id: lowest,
                tokens: self.tokens,
            });
        }

        let token_embeddings_bwc = self.token_embedding.forward(in_sequence_bw.clone());

        let positions_bw = Tensor::<B, 1, Int>::arange(0..words as i64, &in_sequence_bw.device())
            .unsqueeze::<2>()
            .expand([batch, words]);
        let position_embeddings_bwc = self.position_embedding.forward(positions_bw);

        Ok(token_embeddings_bwc + position_embeddings_bwc)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn encoder() -> SequenceEncoder<TestBackend> {
        let params = ModelFactory::new(8, 10, 4, 1, 2);
        SequenceEncoder::new(&params, &Default::default())
    }

    fn ids(values: &[i32], words: usize) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, &Default::default())
            .reshape([values.len() / words, words])
    }

    #[test]
    fn test_embeds_to_the_configured_width() {
        let out = encoder().forward(ids(&[0, 1, 2, 9, 3, 3, 0, 5], 4)).unwrap();
        assert_eq!(out.dims(), [2, 4, 8]);
    }

    #[test]
    fn test_shorter_sequences_are_accepted() {
        let out = encoder().forward(ids(&[1, 2], 2)).unwrap();
        assert_eq!(out.dims(), [1, 2, 8]);
    }

    #[test]
    fn test_rejects_token_id_outside_the_vocabulary() {
        let err = encoder().forward(ids(&[0, 1, 10, 2], 4)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::TokenOutOfRange { id: 10, tokens: 10 }
        ));
    }

    #[test]
    fn test_rejects_sequences_longer_than_the_context_window() {
        let err = encoder()
            .forward(ids(&[0, 1, 2, 3, 4], 5))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::SequenceTooLong { got: 5, words: 4 }
        ));
    }
}
