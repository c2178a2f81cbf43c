// ============================================================
// Layer 5 — Model Factory
// ============================================================
// One hyperparameter struct drives everything: it validates the
// dimensional invariants up front, estimates the parameter count
// for capacity planning, and assembles whichever topology a task
// needs. Constructed once at process start from CLI arguments and
// passed down by reference; nothing in the model layer reads the
// environment.
//
// Vocabulary of dimension names used throughout the model layer:
//   b = batch, w = sequence position (words), c = embedding
//   coordinate, n = heads, k = coordinates / heads, t = tokens.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::attention::AttentionKind;
use crate::model::error::ModelError;
use crate::model::network::{EncoderDecoder, Metaformer, Model, SentimentClassifier};

/// Which topology `create_model` assembles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Encoder,
    Decoder,
    EncoderDecoder,
}

/// The full hyperparameter set of a model.
///
/// `coordinates` is the embedding width, `tokens` the vocabulary
/// size, `words` the context window. `coordinates` must divide
/// evenly into `number_of_heads` subspaces; `validate` enforces
/// this before any tensor is allocated.
#[derive(Config, Debug)]
pub struct ModelFactory {
    pub coordinates: usize,
    pub tokens: usize,
    pub words: usize,
    pub number_of_blocks: usize,
    pub number_of_heads: usize,
    #[config(default = false)]
    pub bias: bool,
    #[config(default = "AttentionKind::ScaledDotProduct")]
    pub attention: AttentionKind,
}

impl ModelFactory {
    /// Width of one attention head's subspace.
    pub fn k_dimension(&self) -> usize {
        self.coordinates / self.number_of_heads
    }

    /// Reject impossible hyperparameter combinations. Called by every
    /// assembly entry point before tensors exist, so a bad combination
    /// fails fast and costs nothing.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coordinates == 0
            || self.tokens == 0
            || self.words == 0
            || self.number_of_blocks == 0
            || self.number_of_heads == 0
        {
            return Err(ModelError::InvalidConfiguration(
                "every dimension must be at least 1".into(),
            ));
        }
        if self.coordinates % self.number_of_heads != 0 {
            return Err(ModelError::InvalidConfiguration(format!(
                "coordinates ({}) must be divisible by number_of_heads ({})",
                self.coordinates, self.number_of_heads
            )));
        }
        Ok(())
    }

    /// Rough parameter count: embedding tables, the dominant 4c² per
    /// block, the final norm and the output projection. An estimate
    /// for pre-flight capacity checks, not an exact census.
    pub fn estimate_model_size(&self) -> usize {
        let sequence_encoder = self.coordinates * self.words + self.coordinates * self.tokens;
        let transformer_blocks =
            4 * self.coordinates * self.coordinates * self.number_of_blocks;
        let final_norm = 2 * self.coordinates;
        let language_model_head = self.coordinates * self.tokens;
        sequence_encoder + transformer_blocks + final_norm + language_model_head
    }

    /// Assemble a device-resident model of the requested topology.
    pub fn create_model<B: Backend>(
        &self,
        kind: ModelKind,
        device: &B::Device,
    ) -> Result<Model<B>, ModelError> {
        self.validate()?;
        tracing::debug!(
            "Assembling {:?} model: ~{} parameters, {} attention",
            kind,
            self.estimate_model_size(),
            self.attention,
        );
        Ok(match kind {
            // Encoder and decoder flavours share the stack; masking is
            // applied uniformly in both.
            ModelKind::Encoder | ModelKind::Decoder => {
                Model::Stack(Metaformer::new(self, device))
            }
            ModelKind::EncoderDecoder => {
                Model::EncoderDecoder(EncoderDecoder::new(self, device))
            }
        })
    }

    /// The generative stack directly, for callers that train it.
    pub fn init_stack<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Metaformer<B>, ModelError> {
        self.validate()?;
        Ok(Metaformer::new(self, device))
    }

    /// The classification variant: same trunk, pooled class head of
    /// `number_of_classes` outputs in place of the vocabulary head.
    pub fn init_classifier<B: Backend>(
        &self,
        number_of_classes: usize,
        device: &B::Device,
    ) -> Result<SentimentClassifier<B>, ModelError> {
        self.validate()?;
        if number_of_classes == 0 {
            return Err(ModelError::InvalidConfiguration(
                "number_of_classes must be at least 1".into(),
            ));
        }
        Ok(SentimentClassifier::new(self, number_of_classes, device))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_construction_requires_divisible_coordinates() {
        // 8 coordinates over 2 heads: fine.
        assert!(ModelFactory::new(8, 10, 4, 1, 2).validate().is_ok());
        // 9 over 3: fine.
        assert!(ModelFactory::new(9, 3, 11, 3, 3).validate().is_ok());
        // 8 over 3: per-head width is not an integer.
        let err = ModelFactory::new(8, 10, 4, 1, 3).validate().unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
        // And the failure happens before any tensors are built.
        let result = ModelFactory::new(8, 10, 4, 1, 3)
            .create_model::<TestBackend>(ModelKind::Decoder, &Default::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        assert!(ModelFactory::new(0, 10, 4, 1, 2).validate().is_err());
        assert!(ModelFactory::new(8, 10, 4, 0, 2).validate().is_err());
    }

    #[test]
    fn test_size_estimate_tracks_the_configuration() {
        let small = ModelFactory::new(8, 10, 4, 1, 2);
        let deeper = ModelFactory::new(8, 10, 4, 4, 2);
        assert!(small.estimate_model_size() > 0);
        assert!(deeper.estimate_model_size() > small.estimate_model_size());

        // Hand-computed for c=8, t=10, w=4, blocks=1:
        // (8*4 + 8*10) + 4*8*8*1 + 2*8 + 8*10 = 464
        assert_eq!(small.estimate_model_size(), 464);
    }

    #[test]
    fn test_encoder_topology_end_to_end() {
        let factory = ModelFactory::new(8, 10, 4, 1, 2);
        let model = factory
            .create_model::<TestBackend>(ModelKind::Encoder, &Default::default())
            .unwrap();

        let input = Tensor::<TestBackend, 1, Int>::from_ints(
            [3, 1, 4, 1, 5, 9, 2, 6].as_slice(),
            &Default::default(),
        )
        .reshape([2, 4]);

        let logits = model.forward(input).unwrap();
        assert_eq!(logits.dims(), [2, 4, 10]);

        // Freshly initialised parameters must give finite logits.
        let values = logits.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_every_topology_assembles() {
        let factory = ModelFactory::new(8, 10, 4, 2, 2).with_attention(AttentionKind::Metric);
        for kind in [ModelKind::Encoder, ModelKind::Decoder, ModelKind::EncoderDecoder] {
            let model = factory
                .create_model::<TestBackend>(kind, &Default::default())
                .unwrap();
            let input = Tensor::<TestBackend, 1, Int>::from_ints(
                [0, 1, 2, 3].as_slice(),
                &Default::default(),
            )
            .reshape([1, 4]);
            assert_eq!(model.forward(input).unwrap().dims(), [1, 4, 10]);
        }
    }
}
