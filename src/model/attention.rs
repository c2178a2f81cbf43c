// ============================================================
// Layer 5 — Self-Attention Variants
// ============================================================
// Two interchangeable attention mechanisms behind one enum:
//
//   ScaledDotProductAttention — the standard formulation,
//       compatibility between positions is the inner product
//       of projected query and key vectors (Q · Kᵀ / √k)
//
//   MetricSelfAttention — compatibility is a learned bilinear
//       form (P · M · Pᵀ / √k) where M is a symmetric per-head
//       metric assembled from free parameters on every call.
//       A single projection plays the query, key, and value
//       roles, so the score is a quadratic form of one map.
//
// Both share the same contract: (batch, words, coordinates) in,
// the same shape out, causal masking below, softmax row
// normalisation, and a final mixing projection.
//
// The variant is chosen once when the model is assembled and
// never switched at runtime.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need

use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};
use serde::{Deserialize, Serialize};

use crate::model::error::ModelError;
use crate::model::factory::ModelFactory;

/// Which attention formulation a model stack uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionKind {
    ScaledDotProduct,
    Metric,
}

impl std::fmt::Display for AttentionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttentionKind::ScaledDotProduct => write!(f, "scaled_dot_product"),
            AttentionKind::Metric => write!(f, "metric"),
        }
    }
}

// ─── Causal Mask ──────────────────────────────────────────────────────────────

/// Build the (words, words) lower-triangular 0/1 mask.
///
/// Built once per model and handed to every attention instance in the
/// stack; burn tensor handles share their storage, so the clones the
/// blocks receive all point at the same buffer. Entries at or below
/// the diagonal are 1 (attendable), entries above are 0 (future).
pub fn causal_mask<B: Backend>(words: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut cells = Vec::with_capacity(words * words);
    for i in 0..words {
        for j in 0..words {
            cells.push(if j <= i { 1.0f32 } else { 0.0 });
        }
    }
    Tensor::<B, 1>::from_floats(cells.as_slice(), device).reshape([words, words])
}

/// Slice the stored mask down to the live sequence length and convert
/// it to the boolean "forbidden" form `mask_fill` expects, broadcast
/// over batch and heads.
fn forbidden_positions<B: Backend>(
    mask_ww: &Tensor<B, 2>,
    batch: usize,
    heads: usize,
    words: usize,
) -> Tensor<B, 4, Bool> {
    mask_ww
        .clone()
        .slice([0..words, 0..words])
        .equal_elem(0.0)
        .unsqueeze::<4>()
        .expand([batch, heads, words, words])
}

// ─── Variant dispatch ─────────────────────────────────────────────────────────

/// Tagged dispatch over the two formulations. The tag is fixed at
/// assembly time by `ModelFactory::attention`.
#[derive(Module, Debug)]
pub enum SelfAttention<B: Backend> {
    ScaledDotProduct(ScaledDotProductAttention<B>),
    Metric(MetricSelfAttention<B>),
}

impl<B: Backend> SelfAttention<B> {
    pub fn new(params: &ModelFactory, mask_ww: Tensor<B, 2>, device: &B::Device) -> Self {
        match params.attention {
            AttentionKind::ScaledDotProduct => Self::ScaledDotProduct(
                ScaledDotProductAttention::new(params, mask_ww, device),
            ),
            AttentionKind::Metric => {
                Self::Metric(MetricSelfAttention::new(params, mask_ww, device))
            }
        }
    }

    /// (batch, words, coordinates) -> (batch, words, coordinates)
    pub fn forward(&self, in_sequence_bwc: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            Self::ScaledDotProduct(attention) => attention.forward(in_sequence_bwc),
            Self::Metric(attention) => attention.forward(in_sequence_bwc),
        }
    }

    /// The per-head bilinear form used to score position pairs,
    /// shape (heads, k, k).
    ///
    /// Only the metric variant carries one; asking the dot-product
    /// variant is an error rather than an identity fabrication, so
    /// callers cannot mistake a fixed geometry for a learned one.
    pub fn metric(&self) -> Result<Tensor<B, 3>, ModelError> {
        match self {
            Self::ScaledDotProduct(_) => Err(ModelError::Unsupported("metric introspection")),
            Self::Metric(attention) => Ok(attention.metric()),
        }
    }
}

// ─── Scaled dot-product attention ─────────────────────────────────────────────

/// Standard multi-head attention with a fused Q/K/V projection.
#[derive(Module, Debug)]
pub struct ScaledDotProductAttention<B: Backend> {
    /// Fused projection, coordinates -> 3 * coordinates, split into
    /// query / key / value thirds on each call.
    pub attention_heads: Linear<B>,
    /// Final mixing projection, coordinates -> coordinates.
    pub mixer: Linear<B>,
    /// Shared lower-triangular mask, (words, words).
    pub mask_ww: Tensor<B, 2>,
    pub number_of_heads: usize,
}

impl<B: Backend> ScaledDotProductAttention<B> {
    pub fn new(params: &ModelFactory, mask_ww: Tensor<B, 2>, device: &B::Device) -> Self {
        let attention_heads = LinearConfig::new(params.coordinates, 3 * params.coordinates)
            .with_bias(params.bias)
            .init(device);
        let mixer = LinearConfig::new(params.coordinates, params.coordinates)
            .with_bias(params.bias)
            .init(device);
        Self {
            attention_heads,
            mixer,
            mask_ww,
            number_of_heads: params.number_of_heads,
        }
    }

    pub fn forward(&self, in_sequence_bwc: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, words, coordinates] = in_sequence_bwc.dims();
        let heads = self.number_of_heads;
        let k_dimension = coordinates / heads;

        // One matmul produces all three projections, then the thirds
        // are carved out of the fused width.
        let fused_bwd = self.attention_heads.forward(in_sequence_bwc);
        let q_bwc = fused_bwd.clone().narrow(2, 0, coordinates);
        let k_bwc = fused_bwd.clone().narrow(2, coordinates, coordinates);
        let v_bwc = fused_bwd.narrow(2, 2 * coordinates, coordinates);

        // Interleave the heads into their own dimension: (b, n, w, k).
        let q_bnwk = q_bwc.reshape([batch, words, heads, k_dimension]).swap_dims(1, 2);
        let k_bnwk = k_bwc.reshape([batch, words, heads, k_dimension]).swap_dims(1, 2);
        let v_bnwk = v_bwc.reshape([batch, words, heads, k_dimension]).swap_dims(1, 2);

        // Pairwise scores, scaled, masked, normalised.
        let scores_bnww = q_bnwk
            .matmul(k_bnwk.swap_dims(2, 3))
            .div_scalar((k_dimension as f32).sqrt());
        let forbidden = forbidden_positions(&self.mask_ww, batch, heads, words);
        let scores_bnww = scores_bnww.mask_fill(forbidden, f32::NEG_INFINITY);
        let weights_bnww = softmax(scores_bnww, 3);

        // Weighted sum of values, heads folded back into the width.
        let context_bnwk = weights_bnww.matmul(v_bnwk);
        let context_bwc = context_bnwk
            .swap_dims(1, 2)
            .reshape([batch, words, coordinates]);

        self.mixer.forward(context_bwc)
    }
}

// ─── Metric attention ─────────────────────────────────────────────────────────

/// Attention scored by a learned symmetric bilinear form.
///
/// A single projection tensor maps the input into every head's
/// k-dimensional subspace and is reused for the query, key, and value
/// roles, so apart from the metric itself the score is symmetric in
/// the two positions. The metric is stored packed (strict upper
/// triangle + diagonal) and assembled on every forward call.
#[derive(Module, Debug)]
pub struct MetricSelfAttention<B: Backend> {
    /// Shared projection, (1, heads, coordinates, k). Not a Linear:
    /// there is deliberately no bias and only one map for all roles.
    pub projection_1nck: Param<Tensor<B, 4>>,
    /// Free entries of the strict upper triangle, (heads, k(k-1)/2).
    pub halves: Param<Tensor<B, 2>>,
    /// Diagonal entries, (heads, k).
    pub diagonals: Param<Tensor<B, 2>>,
    /// Final mixing projection, coordinates -> coordinates.
    pub mixer: Linear<B>,
    /// Shared lower-triangular mask, (words, words).
    pub mask_ww: Tensor<B, 2>,
    pub number_of_heads: usize,
    pub k_dimension: usize,
}

impl<B: Backend> MetricSelfAttention<B> {
    pub fn new(params: &ModelFactory, mask_ww: Tensor<B, 2>, device: &B::Device) -> Self {
        let heads = params.number_of_heads;
        let k = params.k_dimension();

        let projection_1nck = Initializer::Normal { mean: 0.0, std: 0.02 }
            .init([1, heads, params.coordinates, k], device);
        // halves = 0, diagonals = 1: the assembled metric starts as the
        // identity, i.e. exactly the dot-product geometry, and training
        // bends it from there.
        let halves = Initializer::Zeros.init([heads, k * (k - 1) / 2], device);
        let diagonals = Initializer::Ones.init([heads, k], device);

        let mixer = LinearConfig::new(params.coordinates, params.coordinates)
            .with_bias(params.bias)
            .init(device);

        Self {
            projection_1nck,
            halves,
            diagonals,
            mixer,
            mask_ww,
            number_of_heads: heads,
            k_dimension: k,
        }
    }

    /// Column indices (into a flattened k*k matrix) of the strict upper
    /// triangle, row-major, matching the packing order of `halves`.
    fn strict_upper_indices(k: usize) -> Vec<i32> {
        let mut indices = Vec::with_capacity(k * (k - 1) / 2);
        for i in 0..k {
            for j in (i + 1)..k {
                indices.push((i * k + j) as i32);
            }
        }
        indices
    }

    /// Column indices of the diagonal of a flattened k*k matrix.
    fn diagonal_indices(k: usize) -> Vec<i32> {
        (0..k).map(|i| (i * k + i) as i32).collect()
    }

    /// Assemble the per-head metric tensors, (heads, k, k).
    ///
    /// M = H + Hᵀ + diag(d) where H holds `halves` in its strict upper
    /// triangle, so M == Mᵀ for any parameter values. Cheap enough
    /// (heads × k × k) to rebuild on every call instead of caching.
    pub fn metric(&self) -> Tensor<B, 3> {
        let heads = self.number_of_heads;
        let k = self.k_dimension;
        let device = self.halves.val().device();

        let upper_indices = Tensor::<B, 1, Int>::from_ints(
            Self::strict_upper_indices(k).as_slice(),
            &device,
        );
        let half_matrices_nkk = Tensor::<B, 2>::zeros([heads, k * k], &device)
            .select_assign(1, upper_indices, self.halves.val())
            .reshape([heads, k, k]);

        let diagonal_indices =
            Tensor::<B, 1, Int>::from_ints(Self::diagonal_indices(k).as_slice(), &device);
        let diagonal_matrices_nkk = Tensor::<B, 2>::zeros([heads, k * k], &device)
            .select_assign(1, diagonal_indices, self.diagonals.val())
            .reshape([heads, k, k]);

        half_matrices_nkk.clone() + half_matrices_nkk.swap_dims(1, 2) + diagonal_matrices_nkk
    }

    pub fn forward(&self, in_sequence_bwc: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, words, coordinates] = in_sequence_bwc.dims();
        let heads = self.number_of_heads;
        let k = self.k_dimension;

        let metric_nkk = self.metric();

        // Project once; the result serves as query, key, and value.
        let in_sequence_b1wc = in_sequence_bwc.unsqueeze_dim::<4>(1);
        let projections_bnwk = in_sequence_b1wc
            .expand([batch, heads, words, coordinates])
            .matmul(
                self.projection_1nck
                    .val()
                    .expand([batch, heads, coordinates, k]),
            );

        // Quadratic form P · M · Pᵀ instead of the plain inner product.
        let metric_bnkk = metric_nkk.unsqueeze::<4>().expand([batch, heads, k, k]);
        let scores_bnww = projections_bnwk
            .clone()
            .matmul(metric_bnkk)
            .matmul(projections_bnwk.clone().swap_dims(2, 3))
            .div_scalar((k as f32).sqrt());

        let forbidden = forbidden_positions(&self.mask_ww, batch, heads, words);
        let scores_bnww = scores_bnww.mask_fill(forbidden, f32::NEG_INFINITY);
        let weights_bnww = softmax(scores_bnww, 3);

        // Values are aggregated with the normalised weights, not the raw
        // scores: masked positions contribute exactly nothing and each
        // row sums to one.
        let nudged_bnwk = weights_bnww.matmul(projections_bnwk);
        let nudged_bwc = nudged_bnwk.swap_dims(1, 2).reshape([batch, words, coordinates]);

        self.mixer.forward(nudged_bwc)
    }
}

// ─── Cross attention ──────────────────────────────────────────────────────────

/// Multi-head attention between two sequences: queries from the running
/// decoder representation, keys and values from a fixed encoder context.
/// No causal mask, the encoder context is fully visible.
#[derive(Module, Debug)]
pub struct CrossAttention<B: Backend> {
    pub query: Linear<B>,
    pub key: Linear<B>,
    pub value: Linear<B>,
    pub mixer: Linear<B>,
    pub number_of_heads: usize,
}

impl<B: Backend> CrossAttention<B> {
    pub fn new(params: &ModelFactory, device: &B::Device) -> Self {
        let project = || {
            LinearConfig::new(params.coordinates, params.coordinates)
                .with_bias(params.bias)
                .init(device)
        };
        Self {
            query: project(),
            key: project(),
            value: project(),
            mixer: project(),
            number_of_heads: params.number_of_heads,
        }
    }

    /// `sequence_bwc` attends into `context_bvc`; output follows the
    /// query side's shape.
    pub fn forward(&self, sequence_bwc: Tensor<B, 3>, context_bvc: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, words, coordinates] = sequence_bwc.dims();
        let [_, context_words, _] = context_bvc.dims();
        let heads = self.number_of_heads;
        let k_dimension = coordinates / heads;

        let split = |t: Tensor<B, 3>, len: usize| {
            t.reshape([batch, len, heads, k_dimension]).swap_dims(1, 2)
        };
        let q_bnwk = split(self.query.forward(sequence_bwc), words);
        let k_bnvk = split(self.key.forward(context_bvc.clone()), context_words);
        let v_bnvk = split(self.value.forward(context_bvc), context_words);

        let scores_bnwv = q_bnwk
            .matmul(k_bnvk.swap_dims(2, 3))
            .div_scalar((k_dimension as f32).sqrt());
        let weights_bnwv = softmax(scores_bnwv, 3);

        let context_bnwk = weights_bnwv.matmul(v_bnvk);
        let context_bwc = context_bnwk
            .swap_dims(1, 2)
            .reshape([batch, words, coordinates]);

        self.mixer.forward(context_bwc)
    }
}
