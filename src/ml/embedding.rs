// ============================================================
// Layer 5 — Token Embedding Table
// ============================================================
// Maps each token id to a learned vector:
//   [batch, time] ids → [batch, time, embedding_dim]
//
// The same table is applied at every time step. Ids outside
// [0, vocab_size) are rejected before the lookup instead of
// letting the backend index out of bounds.
//
// Reference: Burn Book §3 (Building Blocks: Embedding)

use burn::{
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::domain::error::{self, Seq2SeqError};

#[derive(Config, Debug)]
pub struct TokenEmbeddingConfig {
    pub vocab_size:    usize,
    pub embedding_dim: usize,
}

impl TokenEmbeddingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<TokenEmbedding<B>> {
        if self.vocab_size == 0 || self.embedding_dim == 0 {
            return Err(Seq2SeqError::InvalidConfig(format!(
                "embedding needs vocab_size > 0 and embedding_dim > 0 (got {} and {})",
                self.vocab_size, self.embedding_dim
            )));
        }
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        Ok(TokenEmbedding {
            embedding,
            vocab_size:    self.vocab_size,
            embedding_dim: self.embedding_dim,
        })
    }
}

#[derive(Module, Debug)]
pub struct TokenEmbedding<B: Backend> {
    pub embedding:     Embedding<B>,
    pub vocab_size:    usize,
    pub embedding_dim: usize,
}

impl<B: Backend> TokenEmbedding<B> {
    /// ids: [batch, time] → [batch, time, embedding_dim]
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> error::Result<Tensor<B, 3>> {
        self.check_range(&ids)?;
        Ok(self.embedding.forward(ids))
    }

    fn check_range(&self, ids: &Tensor<B, 2, Int>) -> error::Result<()> {
        let min = ids.clone().min().into_scalar().elem::<i64>();
        let max = ids.clone().max().into_scalar().elem::<i64>();

        let offender = if min < 0 {
            Some(min)
        } else if max >= self.vocab_size as i64 {
            Some(max)
        } else {
            None
        };

        match offender {
            Some(id) => Err(Seq2SeqError::TokenOutOfRange { id, vocab_size: self.vocab_size }),
            None     => Ok(()),
        }
    }
}
