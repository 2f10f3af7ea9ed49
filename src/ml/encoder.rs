// ============================================================
// Layer 5 — Encoder
// ============================================================
// source ids [B, T] ──► (optional) reverse each row up to its length
//                   ──► TokenEmbedding        [B, T, E]
//                   ──► forward LstmStack     [B, T, H]
//                   ──► backward LstmStack    [B, T, H]  (bidirectional)
//                   ──► concat on features    [B, T, H·dirs]
//
// With attention the decoder needs every step, so the encoder
// returns the whole sequence. Without attention it returns a
// summary: the last layer's final hidden state, one per
// direction, concatenated.
//
// The forward and backward stacks own separate weights.

use burn::prelude::*;

use crate::domain::{
    error::{self, Seq2SeqError},
    kinds::RnnType,
    sequence::validate_lengths,
};
use crate::ml::{
    embedding::{TokenEmbedding, TokenEmbeddingConfig},
    lstm::{Direction, LstmStack, LstmStackConfig},
    masking::reverse_padded,
};

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub vocab_size: usize,
    #[config(default = 128)]
    pub embedding_dim: usize,
    #[config(default = 128)]
    pub rnn_hidden_dim: usize,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type: RnnType,
    #[config(default = 1)]
    pub num_rnn_layers: usize,
    #[config(default = true)]
    pub bidirectional: bool,
    #[config(default = true)]
    pub reverse_sequence: bool,
    #[config(default = false)]
    pub skip_connections: bool,
    #[config(default = true)]
    pub add_attention: bool,
    #[config(default = 1.0)]
    pub forget_bias: f64,
}

impl EncoderConfig {
    /// Feature width of every per-step output and of the summary.
    pub fn output_dim(&self) -> usize {
        let directions = if self.bidirectional { 2 } else { 1 };
        self.rnn_hidden_dim * directions
    }

    pub fn validate(&self) -> error::Result<()> {
        if self.vocab_size == 0 || self.embedding_dim == 0 {
            return Err(Seq2SeqError::InvalidConfig(
                "encoder vocab_size and embedding_dim must be positive".to_string(),
            ));
        }
        if self.rnn_hidden_dim == 0 {
            return Err(Seq2SeqError::InvalidConfig(
                "encoder rnn_hidden_dim must be positive".to_string(),
            ));
        }
        if self.num_rnn_layers == 0 {
            return Err(Seq2SeqError::InvalidConfig(
                "encoder needs at least one rnn layer".to_string(),
            ));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<Encoder<B>> {
        self.validate()?;

        let embedding = TokenEmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device)?;
        let stack = match self.rnn_type {
            RnnType::Lstm => LstmStackConfig::new(self.embedding_dim, self.rnn_hidden_dim)
                .with_num_layers(self.num_rnn_layers)
                .with_skip_connections(self.skip_connections)
                .with_forget_bias(self.forget_bias),
        };

        let forward_stack  = stack.init(device)?;
        let backward_stack = if self.bidirectional { Some(stack.init(device)?) } else { None };

        tracing::debug!(
            "Encoder: vocab={}, emb={}, hidden={}, layers={}, bidirectional={}, attention={}",
            self.vocab_size, self.embedding_dim, self.rnn_hidden_dim,
            self.num_rnn_layers, self.bidirectional, self.add_attention
        );

        Ok(Encoder {
            embedding,
            forward_stack,
            backward_stack,
            reverse_sequence: self.reverse_sequence,
            add_attention:    self.add_attention,
        })
    }
}

// ─── Output ───────────────────────────────────────────────────────────────────
/// What the encoder hands to the decoder.
#[derive(Debug, Clone)]
pub enum EncoderOutput<B: Backend> {
    /// Per-step outputs `[batch, time, output_dim]`, zero at padding
    Sequence(Tensor<B, 3>),
    /// Final hidden state `[batch, output_dim]`
    Summary(Tensor<B, 2>),
}

impl<B: Backend> EncoderOutput<B> {
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Sequence(t) => t.dims()[0],
            Self::Summary(t)  => t.dims()[0],
        }
    }

    pub fn feature_dim(&self) -> usize {
        match self {
            Self::Sequence(t) => t.dims()[2],
            Self::Summary(t)  => t.dims()[1],
        }
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding:        TokenEmbedding<B>,
    pub forward_stack:    LstmStack<B>,
    pub backward_stack:   Option<LstmStack<B>>,
    pub reverse_sequence: bool,
    pub add_attention:    bool,
}

impl<B: Backend> Encoder<B> {
    pub fn output_dim(&self) -> usize {
        let directions = if self.backward_stack.is_some() { 2 } else { 1 };
        self.forward_stack.d_hidden * directions
    }

    pub fn forward(
        &self,
        source_ids:     Tensor<B, 2, Int>,
        source_lengths: &[usize],
    ) -> error::Result<EncoderOutput<B>> {
        let [batch_size, max_time] = source_ids.dims();
        validate_lengths(source_lengths, batch_size, max_time)?;

        let ids = if self.reverse_sequence {
            reverse_padded(source_ids, source_lengths)?
        } else {
            source_ids
        };

        let embedded = self.embedding.forward(ids)?;
        let forward  = self.forward_stack.unroll(embedded.clone(), source_lengths, Direction::Forward)?;

        let (outputs, summary) = match &self.backward_stack {
            Some(stack) => {
                let backward = stack.unroll(embedded, source_lengths, Direction::Backward)?;
                let outputs  = Tensor::cat(vec![forward.outputs.clone(), backward.outputs.clone()], 2);
                let summary  = match (forward.final_hidden(), backward.final_hidden()) {
                    (Some(fw), Some(bw)) => Some(Tensor::cat(vec![fw, bw], 1)),
                    _                    => None,
                };
                (outputs, summary)
            }
            None => (forward.outputs.clone(), forward.final_hidden()),
        };

        tracing::debug!("Encoder outputs: {:?}", outputs.dims());

        if self.add_attention {
            return Ok(EncoderOutput::Sequence(outputs));
        }

        summary
            .map(EncoderOutput::Summary)
            .ok_or_else(|| Seq2SeqError::InvalidConfig("encoder stack has no layers".to_string()))
    }
}
