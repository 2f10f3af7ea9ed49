// ============================================================
// Layer 5 — Decoder
// ============================================================
// Teacher-forced decoding loop. For t in 0..max(target_lengths):
//
//   x_t        = embed(target_ids[:, t])                  [B, E]
//   cell_in    = [x_t ; attention_{t-1}]   (attention on) [B, E + A]
//   h_t, c_t   = LSTM(cell_in, h_{t-1}, c_{t-1})
//   attention_t, alignment_t = wrapper(h_t, memory)
//   output_t   = attention_t if output_attention else h_t
//
// State starts at zero every call. Rows whose target is shorter
// than the longest one keep stepping; their trailing outputs
// are computed but carry no meaning.

use burn::prelude::*;

use crate::domain::{
    error::{self, Seq2SeqError},
    kinds::{AttentionType, RnnType},
    sequence::validate_lengths,
};
use crate::ml::{
    attention::{AttentionConfig, AttentionMemory, AttentionWrapper, AttentionWrapperConfig},
    embedding::{TokenEmbedding, TokenEmbeddingConfig},
    encoder::EncoderOutput,
    lstm::{LstmCell, LstmCellConfig, LstmState},
};

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub vocab_size: usize,
    #[config(default = 128)]
    pub embedding_dim: usize,
    #[config(default = 128)]
    pub rnn_hidden_dim: usize,
    #[config(default = 128)]
    pub attention_hidden_dims: usize,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type: RnnType,
    #[config(default = true)]
    pub add_attention: bool,
    #[config(default = "AttentionType::Luong")]
    pub attention_type: AttentionType,
    /// None → emit attention for Luong, raw cell output for Bahdanau
    pub output_attention: Option<bool>,
    /// Width of one encoder output step (2 × 128 for the default encoder)
    #[config(default = 256)]
    pub memory_dim: usize,
    #[config(default = 1.0)]
    pub forget_bias: f64,
}

impl DecoderConfig {
    fn attention_config(&self) -> AttentionWrapperConfig {
        let mechanism = AttentionConfig::new(self.rnn_hidden_dim, self.memory_dim, self.attention_hidden_dims)
            .with_attention_type(self.attention_type);
        AttentionWrapperConfig::new(mechanism)
            .with_attention_hidden_dims(self.attention_hidden_dims)
            .with_output_attention(self.output_attention)
    }

    /// Width of each decoder output step.
    pub fn output_dim(&self) -> usize {
        let emits_attention = self
            .output_attention
            .unwrap_or_else(|| self.attention_type.outputs_attention_by_default());
        if self.add_attention && emits_attention {
            self.attention_hidden_dims
        } else {
            self.rnn_hidden_dim
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<Decoder<B>> {
        let embedding = TokenEmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device)?;

        let attention = if self.add_attention {
            Some(self.attention_config().init(device)?)
        } else {
            None
        };

        let d_input = match &attention {
            Some(_) => self.embedding_dim + self.attention_hidden_dims,
            None    => self.embedding_dim,
        };
        let cell = match self.rnn_type {
            RnnType::Lstm => LstmCellConfig::new(d_input, self.rnn_hidden_dim)
                .with_forget_bias(self.forget_bias)
                .init(device)?,
        };

        tracing::debug!(
            "Decoder: vocab={}, emb={}, hidden={}, attention={} ({}), memory_dim={}",
            self.vocab_size, self.embedding_dim, self.rnn_hidden_dim,
            self.add_attention, self.attention_type, self.memory_dim
        );

        Ok(Decoder {
            embedding,
            cell,
            attention,
            memory_dim: self.memory_dim,
        })
    }
}

// ─── State ────────────────────────────────────────────────────────────────────
/// Everything carried from one decoder step to the next.
#[derive(Debug, Clone)]
pub struct DecoderState<B: Backend> {
    pub lstm:      LstmState<B>,
    /// Previous attention vector, `None` when attention is off
    pub attention: Option<Tensor<B, 2>>,
}

/// Result of one decoder step.
#[derive(Debug, Clone)]
pub struct DecoderStep<B: Backend> {
    pub output:  Tensor<B, 2>,
    pub state:   DecoderState<B>,
    pub weights: Option<Tensor<B, 2>>,
}

#[derive(Debug, Clone)]
pub struct DecoderOutput<B: Backend> {
    /// [batch, steps, output_dim]
    pub outputs:    Tensor<B, 3>,
    /// [batch, steps, source_time] when attention is on
    pub alignments: Option<Tensor<B, 3>>,
}

// ─── Decoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub embedding:  TokenEmbedding<B>,
    pub cell:       LstmCell<B>,
    pub attention:  Option<AttentionWrapper<B>>,
    pub memory_dim: usize,
}

impl<B: Backend> Decoder<B> {
    pub fn add_attention(&self) -> bool {
        self.attention.is_some()
    }

    pub fn output_dim(&self) -> usize {
        match &self.attention {
            Some(wrapper) if wrapper.output_attention => wrapper.attention_hidden_dims,
            _                                         => self.cell.d_hidden,
        }
    }

    pub fn initial_state(&self, batch_size: usize, device: &B::Device) -> DecoderState<B> {
        DecoderState {
            lstm:      LstmState::zeros(batch_size, self.cell.d_hidden, device),
            attention: self
                .attention
                .as_ref()
                .map(|w| Tensor::zeros([batch_size, w.attention_hidden_dims], device)),
        }
    }

    /// One decoding step from an already embedded input `[batch, embedding_dim]`.
    pub fn step(
        &self,
        input:  Tensor<B, 2>,
        state:  &DecoderState<B>,
        memory: Option<&AttentionMemory<B>>,
    ) -> error::Result<DecoderStep<B>> {
        let Some(wrapper) = &self.attention else {
            let lstm = self.cell.step(input, &state.lstm);
            return Ok(DecoderStep {
                output:  lstm.hidden.clone(),
                state:   DecoderState { lstm, attention: None },
                weights: None,
            });
        };

        let memory   = memory.ok_or(Seq2SeqError::MissingMemory)?;
        let previous = state
            .attention
            .clone()
            .ok_or_else(|| Seq2SeqError::InvalidConfig("decoder state has no attention vector".to_string()))?;

        let lstm = self.cell.step(Tensor::cat(vec![input, previous], 1), &state.lstm);
        let (attention, alignment) = wrapper.combine(lstm.hidden.clone(), memory);
        let output = wrapper.step_output(lstm.hidden.clone(), attention.clone());

        Ok(DecoderStep {
            output,
            state:   DecoderState { lstm, attention: Some(attention) },
            weights: Some(alignment.weights),
        })
    }

    /// Teacher-forced pass over `target_ids` (the decoder input sequence).
    pub fn forward(
        &self,
        encoder_output: &EncoderOutput<B>,
        source_lengths: &[usize],
        target_ids:     Tensor<B, 2, Int>,
        target_lengths: &[usize],
    ) -> error::Result<DecoderOutput<B>> {
        let [batch_size, target_time] = target_ids.dims();
        validate_lengths(target_lengths, batch_size, target_time)?;

        if encoder_output.batch_size() != batch_size {
            return Err(Seq2SeqError::BatchMismatch {
                expected: batch_size,
                actual:   encoder_output.batch_size(),
            });
        }

        let memory = match (&self.attention, encoder_output) {
            (Some(wrapper), EncoderOutput::Sequence(values)) => {
                let [_, _, memory_dim] = values.dims();
                if memory_dim != self.memory_dim {
                    return Err(Seq2SeqError::ShapeMismatch {
                        what:     "encoder outputs",
                        expected: vec![self.memory_dim],
                        actual:   vec![memory_dim],
                    });
                }
                Some(wrapper.mechanism.prepare(values.clone(), source_lengths)?)
            }
            (Some(_), EncoderOutput::Summary(_)) => return Err(Seq2SeqError::MissingMemory),
            // TODO: seed the initial state from the encoder summary when attention is off
            (None, EncoderOutput::Sequence(values)) => {
                let [source_batch, source_time, _] = values.dims();
                validate_lengths(source_lengths, source_batch, source_time)?;
                None
            }
            // a summary carries no time axis, so only count and positivity are checked
            (None, EncoderOutput::Summary(_)) => {
                validate_lengths(source_lengths, batch_size, usize::MAX)?;
                None
            }
        };

        let device   = target_ids.device();
        let embedded = self.embedding.forward(target_ids)?;
        let [_, _, embedding_dim] = embedded.dims();
        let steps = target_lengths.iter().copied().max().unwrap_or(0);

        let mut state      = self.initial_state(batch_size, &device);
        let mut outputs    = Vec::with_capacity(steps);
        let mut alignments = Vec::with_capacity(steps);

        for t in 0..steps {
            let x_t = embedded
                .clone()
                .slice([0..batch_size, t..t + 1, 0..embedding_dim])
                .reshape([batch_size, embedding_dim]);

            let step = self.step(x_t, &state, memory.as_ref())?;
            outputs.push(step.output);
            if let Some(weights) = step.weights {
                alignments.push(weights);
            }
            state = step.state;
        }

        let outputs: Tensor<B, 3> = Tensor::stack(outputs, 1);
        let alignments: Option<Tensor<B, 3>> =
            (!alignments.is_empty()).then(|| Tensor::stack(alignments, 1));

        tracing::debug!("Decoder outputs: {:?} over {} steps", outputs.dims(), steps);

        Ok(DecoderOutput { outputs, alignments })
    }
}
