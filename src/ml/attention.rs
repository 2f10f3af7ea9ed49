// ============================================================
// Layer 5 — Attention Mechanism
// ============================================================
// Memory (encoder outputs) is projected once per decode:
//   keys = memory_layer(values)            [B, T, U]   (no bias)
//
// Scores per decoder step, query = cell output [B, Q]:
//   Luong    : score_t = keys_t · query              (Q == U)
//   Bahdanau : score_t = v · tanh(keys_t + W_q·query)
//
// Masking and normalisation:
//   score_t = -1e9 where t >= length
//   weights = softmax(scores)               [B, T]
//   context = Σ_t weights_t · values_t      [B, M]
//
// The wrapper turns (cell output, context) into the attention
// vector the decoder emits and feeds back:
//   attention = tanh(W_c · [cell_output ; context])
//
// Reference: Luong et al. (2015) §3.1, Bahdanau et al. (2015) §3.1

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{softmax, tanh},
};

use crate::domain::{
    error::{self, Seq2SeqError},
    kinds::AttentionType,
    sequence::validate_lengths,
};
use crate::ml::masking::length_mask;

/// Score given to padded memory positions before the softmax.
const PADDING_SCORE: f32 = -1e9;

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct AttentionConfig {
    #[config(default = "AttentionType::Luong")]
    pub attention_type: AttentionType,
    /// Width of the decoder cell output used as the query
    pub query_dim:  usize,
    /// Width of one encoder output step
    pub memory_dim: usize,
    pub num_units:  usize,
}

impl AttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<AttentionMechanism<B>> {
        if self.query_dim == 0 || self.memory_dim == 0 || self.num_units == 0 {
            return Err(Seq2SeqError::InvalidConfig(format!(
                "attention dims must be positive (query={}, memory={}, units={})",
                self.query_dim, self.memory_dim, self.num_units
            )));
        }

        let memory_layer = LinearConfig::new(self.memory_dim, self.num_units)
            .with_bias(false)
            .init(device);

        let mechanism = match self.attention_type {
            AttentionType::Luong => {
                if self.query_dim != self.num_units {
                    return Err(Seq2SeqError::InvalidConfig(format!(
                        "luong attention scores keys·query, so query_dim ({}) must equal num_units ({})",
                        self.query_dim, self.num_units
                    )));
                }
                AttentionMechanism::Luong(LuongAttention {
                    memory_layer,
                    memory_dim: self.memory_dim,
                })
            }
            AttentionType::Bahdanau => AttentionMechanism::Bahdanau(BahdanauAttention {
                memory_layer,
                query_layer: LinearConfig::new(self.query_dim, self.num_units)
                    .with_bias(false)
                    .init(device),
                v: LinearConfig::new(self.num_units, 1).with_bias(false).init(device),
                memory_dim: self.memory_dim,
            }),
        };

        Ok(mechanism)
    }
}

// ─── Variants ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct LuongAttention<B: Backend> {
    pub memory_layer: Linear<B>,
    pub memory_dim:   usize,
}

#[derive(Module, Debug)]
pub struct BahdanauAttention<B: Backend> {
    pub memory_layer: Linear<B>,
    pub query_layer:  Linear<B>,
    pub v:            Linear<B>,
    pub memory_dim:   usize,
}

#[derive(Module, Debug)]
pub enum AttentionMechanism<B: Backend> {
    Luong(LuongAttention<B>),
    Bahdanau(BahdanauAttention<B>),
}

/// Encoder outputs prepared for repeated querying.
#[derive(Debug, Clone)]
pub struct AttentionMemory<B: Backend> {
    /// [batch, time, memory_dim]
    pub values:  Tensor<B, 3>,
    /// [batch, time, num_units]
    pub keys:    Tensor<B, 3>,
    /// [batch, time], true at padded positions
    pub padding: Tensor<B, 2, Bool>,
}

#[derive(Debug, Clone)]
pub struct Alignment<B: Backend> {
    /// [batch, memory_dim]
    pub context: Tensor<B, 2>,
    /// [batch, time], rows sum to 1 over valid positions
    pub weights: Tensor<B, 2>,
}

impl<B: Backend> AttentionMechanism<B> {
    pub fn memory_dim(&self) -> usize {
        match self {
            Self::Luong(m)    => m.memory_dim,
            Self::Bahdanau(m) => m.memory_dim,
        }
    }

    fn memory_layer(&self) -> &Linear<B> {
        match self {
            Self::Luong(m)    => &m.memory_layer,
            Self::Bahdanau(m) => &m.memory_layer,
        }
    }

    /// Project the encoder outputs into keys and build the padding mask.
    pub fn prepare(&self, values: Tensor<B, 3>, lengths: &[usize]) -> error::Result<AttentionMemory<B>> {
        let [batch_size, max_time, memory_dim] = values.dims();
        if memory_dim != self.memory_dim() {
            return Err(Seq2SeqError::ShapeMismatch {
                what:     "attention memory features",
                expected: vec![self.memory_dim()],
                actual:   vec![memory_dim],
            });
        }
        validate_lengths(lengths, batch_size, max_time)?;

        let keys    = self.memory_layer().forward(values.clone());
        let padding = length_mask::<B>(lengths, max_time, &values.device()).equal_elem(0.0);

        Ok(AttentionMemory { values, keys, padding })
    }

    /// Unnormalised scores `[batch, time]` for one query `[batch, query_dim]`.
    pub fn score(&self, query: Tensor<B, 2>, keys: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, max_time, num_units] = keys.dims();
        match self {
            Self::Luong(_) => keys
                .matmul(query.unsqueeze_dim::<3>(2))
                .reshape([batch_size, max_time]),
            Self::Bahdanau(m) => {
                let processed = m
                    .query_layer
                    .forward(query)
                    .unsqueeze_dim::<3>(1)
                    .expand([batch_size, max_time, num_units]);
                m.v.forward(tanh(keys + processed)).reshape([batch_size, max_time])
            }
        }
    }

    /// Masked softmax alignment and the weighted context.
    pub fn attend(&self, query: Tensor<B, 2>, memory: &AttentionMemory<B>) -> Alignment<B> {
        let [batch_size, _, memory_dim] = memory.values.dims();

        let scores  = self
            .score(query, memory.keys.clone())
            .mask_fill(memory.padding.clone(), PADDING_SCORE);
        let weights = softmax(scores, 1);

        let context = weights
            .clone()
            .unsqueeze_dim::<3>(1)
            .matmul(memory.values.clone())
            .reshape([batch_size, memory_dim]);

        Alignment { context, weights }
    }
}

// ─── AttentionWrapper ─────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct AttentionWrapperConfig {
    pub attention: AttentionConfig,
    #[config(default = 128)]
    pub attention_hidden_dims: usize,
    /// None → the variant's default (Luong emits attention, Bahdanau does not)
    pub output_attention: Option<bool>,
}

impl AttentionWrapperConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<AttentionWrapper<B>> {
        if self.attention_hidden_dims == 0 {
            return Err(Seq2SeqError::InvalidConfig(
                "attention_hidden_dims must be positive".to_string(),
            ));
        }

        let mechanism = self.attention.init(device)?;
        let attention_layer = LinearConfig::new(
            self.attention.query_dim + self.attention.memory_dim,
            self.attention_hidden_dims,
        )
        .with_bias(false)
        .init(device);

        let output_attention = self
            .output_attention
            .unwrap_or_else(|| self.attention.attention_type.outputs_attention_by_default());

        Ok(AttentionWrapper {
            mechanism,
            attention_layer,
            attention_hidden_dims: self.attention_hidden_dims,
            output_attention,
        })
    }
}

#[derive(Module, Debug)]
pub struct AttentionWrapper<B: Backend> {
    pub mechanism:             AttentionMechanism<B>,
    pub attention_layer:       Linear<B>,
    pub attention_hidden_dims: usize,
    pub output_attention:      bool,
}

impl<B: Backend> AttentionWrapper<B> {
    /// Query the memory with `cell_output` and build the attention vector.
    /// Returns `[batch, attention_hidden_dims]` and the alignment.
    pub fn combine(
        &self,
        cell_output: Tensor<B, 2>,
        memory:      &AttentionMemory<B>,
    ) -> (Tensor<B, 2>, Alignment<B>) {
        let alignment = self.mechanism.attend(cell_output.clone(), memory);
        let attention = tanh(
            self.attention_layer
                .forward(Tensor::cat(vec![cell_output, alignment.context.clone()], 1)),
        );
        (attention, alignment)
    }

    /// The tensor the decoder emits for a step.
    pub fn step_output(&self, cell_output: Tensor<B, 2>, attention: Tensor<B, 2>) -> Tensor<B, 2> {
        if self.output_attention { attention } else { cell_output }
    }
}
