// ============================================================
// Layer 5 — Seq2Seq Wrapper
// ============================================================
// Binds one Encoder and one Decoder:
//
//   source ids ──► Encoder ──► EncoderOutput ──┐
//   target ids ─────────────────────────────► Decoder ──► DecoderOutput
//
// Both halves must agree on add_attention. The check runs when
// the pair is built, never during a forward pass.

use burn::prelude::*;

use crate::domain::{
    error::{self, Seq2SeqError},
    sequence::SequenceBatch,
    traits::SequencePreprocessor,
};
use crate::ml::{
    decoder::{Decoder, DecoderConfig, DecoderOutput},
    encoder::{Encoder, EncoderConfig},
    masking::ids_tensor,
};

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub encoder: EncoderConfig,
    pub decoder: DecoderConfig,
}

impl Seq2SeqConfig {
    /// Reference configuration: one vocabulary for both sides, every
    /// other hyperparameter at its default.
    pub fn with_vocab(vocab_size: usize) -> Self {
        Self::new(EncoderConfig::new(vocab_size), DecoderConfig::new(vocab_size))
    }

    fn check_attention_flags(&self) -> error::Result<()> {
        if self.encoder.add_attention != self.decoder.add_attention {
            return Err(Seq2SeqError::AttentionMismatch {
                encoder: self.encoder.add_attention,
                decoder: self.decoder.add_attention,
            });
        }
        Ok(())
    }

    /// Flag agreement plus every per-component check, without allocating weights.
    pub fn validate(&self) -> error::Result<()> {
        self.check_attention_flags()?;
        self.encoder.validate()?;
        if self.decoder.vocab_size == 0 || self.decoder.embedding_dim == 0 || self.decoder.rnn_hidden_dim == 0 {
            return Err(Seq2SeqError::InvalidConfig(
                "decoder vocab_size, embedding_dim and rnn_hidden_dim must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build both halves. The decoder's memory width is taken from the
    /// encoder, overriding whatever the decoder config says.
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<Seq2Seq<B>> {
        self.validate()?;

        let encoder = self.encoder.init(device)?;
        let decoder = self
            .decoder
            .clone()
            .with_memory_dim(self.encoder.output_dim())
            .init(device)?;

        Seq2Seq::new(encoder, decoder)
    }
}

// ─── Seq2Seq ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
}

impl<B: Backend> Seq2Seq<B> {
    pub fn new(encoder: Encoder<B>, decoder: Decoder<B>) -> error::Result<Self> {
        if encoder.add_attention != decoder.add_attention() {
            return Err(Seq2SeqError::AttentionMismatch {
                encoder: encoder.add_attention,
                decoder: decoder.add_attention(),
            });
        }
        if decoder.add_attention() && encoder.output_dim() != decoder.memory_dim {
            return Err(Seq2SeqError::ShapeMismatch {
                what:     "decoder memory_dim",
                expected: vec![encoder.output_dim()],
                actual:   vec![decoder.memory_dim],
            });
        }
        Ok(Self { encoder, decoder })
    }

    pub fn output_dim(&self) -> usize {
        self.decoder.output_dim()
    }

    pub fn forward(
        &self,
        source_ids:     Tensor<B, 2, Int>,
        source_lengths: &[usize],
        target_ids:     Tensor<B, 2, Int>,
        target_lengths: &[usize],
    ) -> error::Result<DecoderOutput<B>> {
        let encoded = self.encoder.forward(source_ids, source_lengths)?;
        self.decoder.forward(&encoded, source_lengths, target_ids, target_lengths)
    }

    /// Host-side entry point: run `preprocessor` over both batches,
    /// upload them and call [`Seq2Seq::forward`].
    pub fn forward_batch<P: SequencePreprocessor>(
        &self,
        preprocessor: &P,
        source:       SequenceBatch,
        target:       SequenceBatch,
        device:       &B::Device,
    ) -> error::Result<DecoderOutput<B>> {
        let source = preprocessor.preprocess(source)?;
        let target = preprocessor.preprocess(target)?;

        if source.batch_size() != target.batch_size() {
            return Err(Seq2SeqError::BatchMismatch {
                expected: source.batch_size(),
                actual:   target.batch_size(),
            });
        }

        tracing::debug!(
            "Forward batch: {} rows, source T={}, target T={}",
            source.batch_size(), source.max_time(), target.max_time()
        );

        self.forward(
            ids_tensor(&source, self.encoder.embedding.vocab_size, device)?,
            source.lengths(),
            ids_tensor(&target, self.decoder.embedding.vocab_size, device)?,
            target.lengths(),
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{kinds::AttentionType, traits::Passthrough};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn reference_batch() -> SequenceBatch {
        SequenceBatch::new(vec![vec![0, 1, 2, 3], vec![0, 1, 2, 3]], vec![4, 4]).unwrap()
    }

    fn small(vocab: usize) -> Seq2SeqConfig {
        Seq2SeqConfig::new(
            EncoderConfig::new(vocab).with_embedding_dim(8).with_rnn_hidden_dim(8),
            DecoderConfig::new(vocab)
                .with_embedding_dim(8)
                .with_rnn_hidden_dim(8)
                .with_attention_hidden_dims(8),
        )
    }

    #[test]
    fn test_reference_scenario_two_layers() {
        let device = Default::default();
        let mut config = Seq2SeqConfig::with_vocab(4);
        config.encoder.num_rnn_layers = 2;

        let model = config.init::<TestBackend>(&device).unwrap();
        let out = model
            .forward_batch(&Passthrough, reference_batch(), reference_batch(), &device)
            .unwrap();

        assert_eq!(out.outputs.dims(), [2, 4, model.output_dim()]);
        let values: Vec<f32> = out.outputs.into_data().to_vec().unwrap();
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_init_sizes_decoder_memory_from_encoder() {
        let model = small(6)
            .init::<TestBackend>(&Default::default())
            .unwrap();
        assert_eq!(model.decoder.memory_dim, 16);
    }

    #[test]
    fn test_config_attention_mismatch() {
        let mut config = small(4);
        config.decoder.add_attention = false;
        let err = config.init::<TestBackend>(&Default::default()).unwrap_err();
        assert_eq!(err, Seq2SeqError::AttentionMismatch { encoder: true, decoder: false });
    }

    #[test]
    fn test_new_rejects_mismatched_components() {
        let device  = Default::default();
        let encoder = EncoderConfig::new(4).with_embedding_dim(4).with_rnn_hidden_dim(4).init::<TestBackend>(&device).unwrap();
        let decoder = DecoderConfig::new(4)
            .with_embedding_dim(4)
            .with_rnn_hidden_dim(4)
            .with_add_attention(false)
            .init::<TestBackend>(&device)
            .unwrap();
        let err = Seq2Seq::new(encoder, decoder).unwrap_err();
        assert!(matches!(err, Seq2SeqError::AttentionMismatch { .. }));
    }

    #[test]
    fn test_forward_is_deterministic() {
        let device = Default::default();
        let model  = small(4).init::<TestBackend>(&device).unwrap();
        let run = || {
            model
                .forward_batch(&Passthrough, reference_batch(), reference_batch(), &device)
                .unwrap()
                .outputs
                .into_data()
                .to_vec::<f32>()
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_without_attention_end_to_end() {
        let device = Default::default();
        let mut config = small(4);
        config.encoder.add_attention = false;
        config.decoder.add_attention = false;

        let model  = config.init::<TestBackend>(&device).unwrap();
        let target = SequenceBatch::new(vec![vec![1, 2, 0], vec![3, 2, 1]], vec![2, 3]).unwrap();
        let out    = model.forward_batch(&Passthrough, reference_batch(), target, &device).unwrap();

        assert_eq!(out.outputs.dims(), [2, 3, 8]);
        assert!(out.alignments.is_none());
    }

    #[test]
    fn test_bahdanau_end_to_end() {
        let device = Default::default();
        let mut config = small(4);
        config.decoder.attention_type = AttentionType::Bahdanau;

        let model = config.init::<TestBackend>(&device).unwrap();
        let out   = model.forward_batch(&Passthrough, reference_batch(), reference_batch(), &device).unwrap();
        assert_eq!(out.alignments.unwrap().dims(), [2, 4, 4]);
    }

    #[test]
    fn test_batch_size_disagreement() {
        let device = Default::default();
        let model  = small(4).init::<TestBackend>(&device).unwrap();
        let target = SequenceBatch::new(vec![vec![1, 2]], vec![2]).unwrap();
        let err    = model.forward_batch(&Passthrough, reference_batch(), target, &device).unwrap_err();
        assert_eq!(err, Seq2SeqError::BatchMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_preprocessor_runs_on_both_batches() {
        struct Clamp(u32);
        impl SequencePreprocessor for Clamp {
            fn preprocess(&self, batch: SequenceBatch) -> error::Result<SequenceBatch> {
                let ids = batch.ids().iter().map(|row| row.iter().map(|&id| id.min(self.0)).collect()).collect();
                SequenceBatch::new(ids, batch.lengths().to_vec())
            }
        }

        let device = Default::default();
        let model  = small(4).init::<TestBackend>(&device).unwrap();
        let wild   = SequenceBatch::new(vec![vec![0, 9, 2, 3], vec![0, 1, 7, 3]], vec![4, 4]).unwrap();

        assert_eq!(
            model.forward_batch(&Passthrough, wild.clone(), wild.clone(), &device).unwrap_err(),
            Seq2SeqError::TokenOutOfRange { id: 9, vocab_size: 4 }
        );
        assert!(model.forward_batch(&Clamp(3), wild.clone(), wild, &device).is_ok());
    }
}
