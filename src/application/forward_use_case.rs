// ============================================================
// Layer 2 — Forward Use Case
// ============================================================
// Workflow for `tensorshake demo`:
//   1. Pick the input batches (reference pair or random)
//   2. Hand config + batches to the ML runner
//   3. Log the report and optionally persist it as JSON

use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

use crate::domain::sequence::SequenceBatch;
use crate::infra::report::{ForwardReport, ReportWriter};
use crate::ml::{
    runner::{run_forward, ComputeBackend},
    seq2seq::Seq2SeqConfig,
};

/// Id written into positions past a row's length.
const PAD_ID: u32 = 0;

/// Where the input batches come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    /// source = target = [[0,1,2,3],[0,1,2,3]], lengths [4,4]
    Reference,
    /// Random ids and random valid lengths in 1..=max_len
    Random { batch_size: usize, max_len: usize },
}

#[derive(Debug, Clone)]
pub struct ForwardConfig {
    pub model:       Seq2SeqConfig,
    pub backend:     ComputeBackend,
    pub seed:        u64,
    pub batch:       BatchSource,
    pub report_path: Option<PathBuf>,
}

pub struct ForwardUseCase {
    config: ForwardConfig,
}

impl ForwardUseCase {
    pub fn new(config: ForwardConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ForwardReport> {
        let cfg = &self.config;

        // ── Step 1: Input batches ─────────────────────────────────────────────
        let (source, target) = match cfg.batch {
            BatchSource::Reference => (demo_batch()?, demo_batch()?),
            BatchSource::Random { batch_size, max_len } => {
                let mut rng = StdRng::seed_from_u64(cfg.seed);
                let source  = random_batch(&mut rng, batch_size, max_len, cfg.model.encoder.vocab_size)?;
                let target  = random_batch(&mut rng, batch_size, max_len, cfg.model.decoder.vocab_size)?;
                (source, target)
            }
        };
        tracing::info!(
            "Running forward pass on {} sequences (source T={}, target T={}) with backend '{}'",
            source.batch_size(), source.max_time(), target.max_time(), cfg.backend.name()
        );

        // ── Step 2: Build and run the model (Layer 5) ─────────────────────────
        let report = run_forward(&cfg.model, source, target, cfg.backend, cfg.seed)?;
        tracing::info!("{}", report.summary_line());

        if !report.all_finite {
            tracing::warn!("Decoder outputs contain non-finite values");
        }

        // ── Step 3: Persist the report ────────────────────────────────────────
        if let Some(path) = &cfg.report_path {
            ReportWriter::new(path.clone()).write(&report)?;
            tracing::info!("Report written to '{}'", path.display());
        }

        Ok(report)
    }
}

/// The fixed two-row batch used as the end-to-end smoke test.
pub fn demo_batch() -> Result<SequenceBatch> {
    Ok(SequenceBatch::new(
        vec![vec![0, 1, 2, 3], vec![0, 1, 2, 3]],
        vec![4, 4],
    )?)
}

/// `batch_size` rows of random ids with random valid lengths, padded with `PAD_ID`.
pub fn random_batch<R: Rng>(
    rng:        &mut R,
    batch_size: usize,
    max_len:    usize,
    vocab_size: usize,
) -> Result<SequenceBatch> {
    if batch_size == 0 || max_len == 0 || vocab_size == 0 {
        bail!(
            "random batch needs positive batch size, length and vocabulary (got {batch_size}, {max_len}, {vocab_size})"
        );
    }

    let sequences: Vec<Vec<u32>> = (0..batch_size)
        .map(|_| {
            let length = rng.gen_range(1..=max_len);
            (0..length).map(|_| rng.gen_range(0..vocab_size as u32)).collect()
        })
        .collect();

    Ok(SequenceBatch::from_sequences(sequences, PAD_ID)?)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{decoder::DecoderConfig, encoder::EncoderConfig};

    #[test]
    fn test_random_batch_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let batch   = random_batch(&mut rng, 16, 7, 5).unwrap();

        assert_eq!(batch.batch_size(), 16);
        assert!(batch.max_time() <= 7);
        assert!(batch.lengths().iter().all(|&l| (1..=7).contains(&l)));
        assert!(batch.ids().iter().flatten().all(|&id| id < 5));
    }

    #[test]
    fn test_random_batch_is_seeded() {
        let a = random_batch(&mut StdRng::seed_from_u64(9), 4, 6, 10).unwrap();
        let b = random_batch(&mut StdRng::seed_from_u64(9), 4, 6, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_batch_rejects_zero_sizes() {
        assert!(random_batch(&mut StdRng::seed_from_u64(0), 0, 3, 4).is_err());
        assert!(random_batch(&mut StdRng::seed_from_u64(0), 2, 0, 4).is_err());
    }

    #[test]
    fn test_execute_writes_report() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let model = Seq2SeqConfig::new(
            EncoderConfig::new(6).with_embedding_dim(4).with_rnn_hidden_dim(4),
            DecoderConfig::new(6)
                .with_embedding_dim(4)
                .with_rnn_hidden_dim(4)
                .with_attention_hidden_dims(4),
        );
        let use_case = ForwardUseCase::new(ForwardConfig {
            model,
            backend:     ComputeBackend::NdArray,
            seed:        1,
            batch:       BatchSource::Random { batch_size: 3, max_len: 5 },
            report_path: Some(path.clone()),
        });

        let report = use_case.execute().unwrap();
        assert_eq!(report.batch_size, 3);
        assert!(report.all_finite);
        assert!(path.exists());
    }
}
