// ============================================================
// Layer 5 — Forward Runner
// ============================================================
// The one place that names concrete backends:
//   - ComputeBackend::NdArray → CPU, always available
//   - ComputeBackend::Wgpu    → GPU through WGPU
//
// For the chosen backend it seeds the RNG (so weight init is
// reproducible), builds the model from Seq2SeqConfig, runs one
// forward pass and turns the output tensors into a
// ForwardReport the other layers can handle without Burn.

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::domain::{sequence::SequenceBatch, traits::Passthrough};
use crate::infra::report::ForwardReport;
use crate::ml::seq2seq::Seq2SeqConfig;

type CpuBackend = burn::backend::NdArray;
type GpuBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBackend {
    NdArray,
    Wgpu,
}

impl ComputeBackend {
    pub fn name(self) -> &'static str {
        match self {
            Self::NdArray => "ndarray",
            Self::Wgpu    => "wgpu",
        }
    }
}

/// Build the model on `backend` and summarise one teacher-forced pass.
pub fn run_forward(
    config:  &Seq2SeqConfig,
    source:  SequenceBatch,
    target:  SequenceBatch,
    backend: ComputeBackend,
    seed:    u64,
) -> Result<ForwardReport> {
    match backend {
        ComputeBackend::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            forward_on::<CpuBackend>(config, source, target, &device, backend, seed)
        }
        ComputeBackend::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            forward_on::<GpuBackend>(config, source, target, &device, backend, seed)
        }
    }
}

fn forward_on<B: Backend>(
    config:  &Seq2SeqConfig,
    source:  SequenceBatch,
    target:  SequenceBatch,
    device:  &B::Device,
    backend: ComputeBackend,
    seed:    u64,
) -> Result<ForwardReport> {
    B::seed(seed);

    let model = config
        .init::<B>(device)
        .context("Failed to build the seq2seq model")?;
    tracing::info!(
        "Model ready: encoder width {}, decoder output width {}",
        model.encoder.output_dim(),
        model.output_dim()
    );

    let source_max_time = source.max_time();
    let output = model
        .forward_batch(&Passthrough, source, target, device)
        .context("Forward pass failed")?;

    let shape   = output.outputs.dims();
    let values  = to_f32(output.outputs)?;
    let sums    = match output.alignments {
        Some(alignments) => Some(to_f32(alignments.sum_dim(2))?),
        None             => None,
    };

    Ok(ForwardReport::from_values(
        backend.name(),
        shape,
        source_max_time,
        &values,
        sums.as_deref(),
    ))
}

fn to_f32<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{decoder::DecoderConfig, encoder::EncoderConfig};

    fn batch() -> SequenceBatch {
        SequenceBatch::new(vec![vec![0, 1, 2, 3], vec![3, 2, 1, 0]], vec![4, 3]).unwrap()
    }

    fn config() -> Seq2SeqConfig {
        Seq2SeqConfig::new(
            EncoderConfig::new(4).with_embedding_dim(8).with_rnn_hidden_dim(8),
            DecoderConfig::new(4)
                .with_embedding_dim(8)
                .with_rnn_hidden_dim(8)
                .with_attention_hidden_dims(8),
        )
    }

    #[test]
    fn test_report_on_cpu() {
        let report = run_forward(&config(), batch(), batch(), ComputeBackend::NdArray, 7).unwrap();
        assert_eq!(report.backend, "ndarray");
        assert_eq!((report.batch_size, report.steps, report.output_dim), (2, 4, 8));
        assert!(report.all_finite);
        assert!(report.max_alignment_deviation.unwrap() < 1e-4);
    }

    #[test]
    fn test_model_errors_carry_context() {
        let mut cfg = config();
        cfg.decoder.add_attention = false;
        let err = run_forward(&cfg, batch(), batch(), ComputeBackend::NdArray, 0).unwrap_err();
        assert!(format!("{err:#}").contains("attention option needs to sync"));
    }
}
