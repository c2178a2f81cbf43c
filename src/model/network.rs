// ============================================================
// Layer 5 — Assembled Topologies
// ============================================================
// The three network shapes the factory can produce:
//
//   Metaformer          — a single stack of transformer blocks
//                         over the sequence encoder, projecting
//                         back to vocabulary logits per position.
//                         Serves both the "encoder" and "decoder"
//                         flavours (masking is uniformly causal).
//
//   EncoderDecoder      — an encoder stack whose output is fused
//                         into a decoder stack of junction blocks
//                         through cross attention.
//
//   SentimentClassifier — the same trunk with the per-position
//                         vocabulary head replaced by a pooled
//                         per-sequence class head.
//
// Each owns its embedding tables, its blocks, its output head and
// its causal mask; parameters are mutated only by the optimizer
// between steps, never inside a forward pass.

use burn::{
    nn::{LayerNorm, LayerNormConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::model::attention::causal_mask;
use crate::model::block::{JunctionBlock, TransformerBlock};
use crate::model::encoder::SequenceEncoder;
use crate::model::error::ModelError;
use crate::model::factory::ModelFactory;

// ─── Generative stack ─────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct Metaformer<B: Backend> {
    pub sequence_encoder: SequenceEncoder<B>,
    pub blocks: Vec<TransformerBlock<B>>,
    pub final_norm: LayerNorm<B>,
    pub language_model_head: Linear<B>,
}

impl<B: Backend> Metaformer<B> {
    pub fn new(params: &ModelFactory, device: &B::Device) -> Self {
        // One mask for the whole stack; every block receives a handle
        // to the same buffer.
        let mask_ww = causal_mask::<B>(params.words, device);
        let blocks = (0..params.number_of_blocks)
            .map(|_| TransformerBlock::new(params, mask_ww.clone(), device))
            .collect();

        Self {
            sequence_encoder: SequenceEncoder::new(params, device),
            blocks,
            final_norm: LayerNormConfig::new(params.coordinates).init(device),
            language_model_head: LinearConfig::new(params.coordinates, params.tokens)
                .with_bias(params.bias)
                .init(device),
        }
    }

    /// (batch, words) ids -> (batch, words, tokens) logits.
    pub fn forward(
        &self,
        in_sequence_bw: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let mut sequence_bwc = self.sequence_encoder.forward(in_sequence_bw)?;
        for block in &self.blocks {
            sequence_bwc = block.forward(sequence_bwc);
        }
        let sequence_bwc = self.final_norm.forward(sequence_bwc);
        Ok(self.language_model_head.forward(sequence_bwc))
    }
}

// ─── Encoder-decoder ──────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct EncoderDecoder<B: Backend> {
    /// Shared by the source and target sides.
    pub sequence_encoder: SequenceEncoder<B>,
    pub encoder_blocks: Vec<TransformerBlock<B>>,
    pub junction_blocks: Vec<JunctionBlock<B>>,
    pub final_norm: LayerNorm<B>,
    pub language_model_head: Linear<B>,
}

impl<B: Backend> EncoderDecoder<B> {
    pub fn new(params: &ModelFactory, device: &B::Device) -> Self {
        let mask_ww = causal_mask::<B>(params.words, device);
        let encoder_blocks = (0..params.number_of_blocks)
            .map(|_| TransformerBlock::new(params, mask_ww.clone(), device))
            .collect();
        let junction_blocks = (0..params.number_of_blocks)
            .map(|_| JunctionBlock::new(params, mask_ww.clone(), device))
            .collect();

        Self {
            sequence_encoder: SequenceEncoder::new(params, device),
            encoder_blocks,
            junction_blocks,
            final_norm: LayerNormConfig::new(params.coordinates).init(device),
            language_model_head: LinearConfig::new(params.coordinates, params.tokens)
                .with_bias(params.bias)
                .init(device),
        }
    }

    /// Autoregressive target ids plus fully visible source ids ->
    /// (batch, words, tokens) logits over the target side.
    pub fn forward(
        &self,
        target_sequence_bw: Tensor<B, 2, Int>,
        source_sequence_bw: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let mut context_bwc = self.sequence_encoder.forward(source_sequence_bw)?;
        for block in &self.encoder_blocks {
            context_bwc = block.forward(context_bwc);
        }

        let mut sequence_bwc = self.sequence_encoder.forward(target_sequence_bw)?;
        for block in &self.junction_blocks {
            sequence_bwc = block.forward(sequence_bwc, context_bwc.clone());
        }

        let sequence_bwc = self.final_norm.forward(sequence_bwc);
        Ok(self.language_model_head.forward(sequence_bwc))
    }
}

// ─── Classification head ──────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct SentimentClassifier<B: Backend> {
    pub sequence_encoder: SequenceEncoder<B>,
    pub blocks: Vec<TransformerBlock<B>>,
    pub final_norm: LayerNorm<B>,
    pub class_head: Linear<B>,
}

impl<B: Backend> SentimentClassifier<B> {
    pub fn new(params: &ModelFactory, number_of_classes: usize, device: &B::Device) -> Self {
        let mask_ww = causal_mask::<B>(params.words, device);
        let blocks = (0..params.number_of_blocks)
            .map(|_| TransformerBlock::new(params, mask_ww.clone(), device))
            .collect();

        Self {
            sequence_encoder: SequenceEncoder::new(params, device),
            blocks,
            final_norm: LayerNormConfig::new(params.coordinates).init(device),
            class_head: LinearConfig::new(params.coordinates, number_of_classes)
                .with_bias(params.bias)
                .init(device),
        }
    }

    /// (batch, words) ids -> (batch, classes) logits, one row per
    /// sequence: the final representation is mean-pooled over
    /// positions before the class head.
    pub fn forward(
        &self,
        in_sequence_bw: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 2>, ModelError> {
        let mut sequence_bwc = self.sequence_encoder.forward(in_sequence_bw)?;
        for block in &self.blocks {
            sequence_bwc = block.forward(sequence_bwc);
        }
        let sequence_bwc = self.final_norm.forward(sequence_bwc);

        let [batch, _, coordinates] = sequence_bwc.dims();
        let pooled_bc = sequence_bwc.mean_dim(1).reshape([batch, coordinates]);
        Ok(self.class_head.forward(pooled_bc))
    }
}

// ─── Factory return type ──────────────────────────────────────────────────────

/// What `ModelFactory::create_model` hands back: either a plain stack
/// (encoder or decoder flavour) or the fused two-stack topology.
#[derive(Module, Debug)]
pub enum Model<B: Backend> {
    Stack(Metaformer<B>),
    EncoderDecoder(EncoderDecoder<B>),
}

impl<B: Backend> Model<B> {
    /// Single-input forward. The fused topology reads the same ids on
    /// both sides; callers that have a distinct source sequence should
    /// use `EncoderDecoder::forward` directly.
    pub fn forward(
        &self,
        in_sequence_bw: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        match self {
            Self::Stack(model) => model.forward(in_sequence_bw),
            Self::EncoderDecoder(model) => {
                model.forward(in_sequence_bw.clone(), in_sequence_bw)
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attention::AttentionKind;

    type TestBackend = burn::backend::NdArray;

    fn ids(values: &[i32], words: usize) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, &Default::default())
            .reshape([values.len() / words, words])
    }

    #[test]
    fn test_encoder_decoder_produces_target_side_logits() {
        let params = ModelFactory::new(8, 10, 4, 1, 2);
        let model = EncoderDecoder::<TestBackend>::new(&params, &Default::default());

        let target = ids(&[0, 1, 2, 3, 4, 5, 6, 7], 4);
        let source = ids(&[7, 6, 5, 4, 3, 2, 1, 0], 4);
        let logits = model.forward(target, source).unwrap();
        assert_eq!(logits.dims(), [2, 4, 10]);
    }

    #[test]
    fn test_classifier_pools_to_one_row_per_sequence() {
        for kind in [AttentionKind::ScaledDotProduct, AttentionKind::Metric] {
            let params = ModelFactory::new(8, 10, 4, 1, 2).with_attention(kind);
            let model =
                SentimentClassifier::<TestBackend>::new(&params, 5, &Default::default());
            let logits = model.forward(ids(&[0, 1, 2, 3, 4, 5, 6, 7], 4)).unwrap();
            assert_eq!(logits.dims(), [2, 5]);
        }
    }

    #[test]
    fn test_bad_ids_surface_through_the_whole_stack() {
        let params = ModelFactory::new(8, 10, 4, 1, 2);
        let model = Metaformer::<TestBackend>::new(&params, &Default::default());
        let err = model.forward(ids(&[0, 1, 2, 11], 4)).unwrap_err();
        assert!(matches!(err, ModelError::TokenOutOfRange { .. }));
    }
}
