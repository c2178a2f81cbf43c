// ============================================================
// Layer 5 — Transformer Blocks
// ============================================================
// TransformerBlock — pre-norm residual wiring around one
//   self-attention sublayer and one position-wise feed-forward
//   sublayer (4x expansion, GELU). Stateless apart from its
//   learned parameters: output is a pure function of the input.
//
// JunctionBlock — the encoder-decoder fusion block. Causally
//   masked self-attention on the decoder stream, then cross
//   attention into the fixed encoder context (fully visible,
//   no causal mask), then the feed-forward sublayer, each with
//   its own pre-norm and residual skip.

use burn::{
    nn::{LayerNorm, LayerNormConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::gelu,
};

use crate::model::attention::{CrossAttention, SelfAttention};
use crate::model::factory::ModelFactory;

const FEED_FORWARD_EXPANSION: usize = 4;

// ─── Feed-forward sublayer ────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub expand: Linear<B>,
    pub contract: Linear<B>,
}

impl<B: Backend> FeedForward<B> {
    pub fn new(params: &ModelFactory, device: &B::Device) -> Self {
        let hidden = FEED_FORWARD_EXPANSION * params.coordinates;
        Self {
            expand: LinearConfig::new(params.coordinates, hidden)
                .with_bias(params.bias)
                .init(device),
            contract: LinearConfig::new(hidden, params.coordinates)
                .with_bias(params.bias)
                .init(device),
        }
    }

    pub fn forward(&self, sequence_bwc: Tensor<B, 3>) -> Tensor<B, 3> {
        self.contract.forward(gelu(self.expand.forward(sequence_bwc)))
    }
}

// ─── TransformerBlock ─────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct TransformerBlock<B: Backend> {
    pub attention_norm: LayerNorm<B>,
    pub attention: SelfAttention<B>,
    pub feed_forward_norm: LayerNorm<B>,
    pub feed_forward: FeedForward<B>,
}

impl<B: Backend> TransformerBlock<B> {
    pub fn new(params: &ModelFactory, mask_ww: Tensor<B, 2>, device: &B::Device) -> Self {
        Self {
            attention_norm: LayerNormConfig::new(params.coordinates).init(device),
            attention: SelfAttention::new(params, mask_ww, device),
            feed_forward_norm: LayerNormConfig::new(params.coordinates).init(device),
            feed_forward: FeedForward::new(params, device),
        }
    }

    /// (batch, words, coordinates) -> (batch, words, coordinates)
    pub fn forward(&self, sequence_bwc: Tensor<B, 3>) -> Tensor<B, 3> {
        let sequence_bwc = sequence_bwc.clone()
            + self.attention.forward(self.attention_norm.forward(sequence_bwc));
        sequence_bwc.clone()
            + self
                .feed_forward
                .forward(self.feed_forward_norm.forward(sequence_bwc))
    }
}

// ─── JunctionBlock ────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct JunctionBlock<B: Backend> {
    pub self_attention_norm: LayerNorm<B>,
    pub self_attention: SelfAttention<B>,
    pub cross_attention_norm: LayerNorm<B>,
    pub cross_attention: CrossAttention<B>,
    pub feed_forward_norm: LayerNorm<B>,
    pub feed_forward: FeedForward<B>,
}

impl<B: Backend> JunctionBlock<B> {
    pub fn new(params: &ModelFactory, mask_ww: Tensor<B, 2>, device: &B::Device) -> Self {
        Self {
            self_attention_norm: LayerNormConfig::new(params.coordinates).init(device),
            self_attention: SelfAttention::new(params, mask_ww, device),
            cross_attention_norm: LayerNormConfig::new(params.coordinates).init(device),
            cross_attention: CrossAttention::new(params, device),
            feed_forward_norm: LayerNormConfig::new(params.coordinates).init(device),
            feed_forward: FeedForward::new(params, device),
        }
    }

    /// Fuse the encoder context into the running decoder representation.
    /// Both inputs are (batch, words, coordinates); the output follows
    /// the decoder side.
    pub fn forward(
        &self,
        sequence_bwc: Tensor<B, 3>,
        encoder_context_bwc: Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        let sequence_bwc = sequence_bwc.clone()
            + self
                .self_attention
                .forward(self.self_attention_norm.forward(sequence_bwc));
        let sequence_bwc = sequence_bwc.clone()
            + self.cross_attention.forward(
                self.cross_attention_norm.forward(sequence_bwc),
                encoder_context_bwc,
            );
        sequence_bwc.clone()
            + self
                .feed_forward
                .forward(self.feed_forward_norm.forward(sequence_bwc))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attention::{causal_mask, AttentionKind};

    type TestBackend = burn::backend::NdArray;

    fn random(shape: [usize; 3]) -> Tensor<TestBackend, 3> {
        Tensor::random(shape, burn::tensor::Distribution::Default, &Default::default())
    }

    #[test]
    fn test_block_preserves_shape_for_both_attention_kinds() {
        let device = Default::default();
        for kind in [AttentionKind::ScaledDotProduct, AttentionKind::Metric] {
            let params = ModelFactory::new(8, 10, 4, 1, 2).with_attention(kind);
            let mask = causal_mask::<TestBackend>(params.words, &device);
            let block = TransformerBlock::new(&params, mask, &device);
            assert_eq!(block.forward(random([2, 4, 8])).dims(), [2, 4, 8]);
        }
    }

    #[test]
    fn test_junction_block_preserves_decoder_shape() {
        let device = Default::default();
        let params = ModelFactory::new(8, 10, 4, 1, 2);
        let mask = causal_mask::<TestBackend>(params.words, &device);
        let block = JunctionBlock::new(&params, mask, &device);

        let decoder_side = random([2, 4, 8]);
        let encoder_side = random([2, 4, 8]);
        assert_eq!(block.forward(decoder_side, encoder_side).dims(), [2, 4, 8]);
    }
}
