// ============================================================
// Layer 6 — Forward Report
// ============================================================
// A serialisable summary of one forward pass, so a run can be
// checked without looking at raw tensors:
//
//   batch_size, steps, output_dim  — shape of the decoder output
//   all_finite                     — no NaN / inf anywhere
//   min / mean / max               — value range of the outputs
//   max_alignment_deviation        — worst |Σ weights − 1| over
//                                    every row and step
//
// Example JSON output:
//   {
//     "backend": "ndarray",
//     "batch_size": 2,
//     "steps": 4,
//     "output_dim": 128,
//     "all_finite": true,
//     ...
//   }

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardReport {
    pub backend:         String,
    pub batch_size:      usize,
    pub source_max_time: usize,
    pub steps:           usize,
    pub output_dim:      usize,
    pub all_finite:      bool,
    pub min:             f32,
    pub mean:            f32,
    pub max:             f32,

    /// None when the model runs without attention
    pub max_alignment_deviation: Option<f32>,
}

impl ForwardReport {
    /// Build a report from flattened decoder outputs and, when present,
    /// the per-(row, step) sums of the alignment weights.
    pub fn from_values(
        backend:         impl Into<String>,
        shape:           [usize; 3],
        source_max_time: usize,
        outputs:         &[f32],
        alignment_sums:  Option<&[f32]>,
    ) -> Self {
        let [batch_size, steps, output_dim] = shape;

        let all_finite = outputs.iter().all(|v| v.is_finite());
        let min = outputs.iter().copied().fold(f32::INFINITY, f32::min);
        let max = outputs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean = if outputs.is_empty() {
            0.0
        } else {
            outputs.iter().sum::<f32>() / outputs.len() as f32
        };

        let max_alignment_deviation = alignment_sums.map(|sums| {
            sums.iter().map(|s| (s - 1.0).abs()).fold(0.0, f32::max)
        });

        Self {
            backend: backend.into(),
            batch_size,
            source_max_time,
            steps,
            output_dim,
            all_finite,
            min,
            mean,
            max,
            max_alignment_deviation,
        }
    }

    /// Short one-line form for logs and the terminal.
    pub fn summary_line(&self) -> String {
        let alignment = match self.max_alignment_deviation {
            Some(d) => format!("{d:.2e}"),
            None    => "n/a".to_string(),
        };
        format!(
            "[{}] output {}x{}x{} | finite={} | min={:.4} mean={:.4} max={:.4} | alignment dev={}",
            self.backend, self.batch_size, self.steps, self.output_dim,
            self.all_finite, self.min, self.mean, self.max, alignment
        )
    }
}

/// Writes reports as pretty JSON.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, report: &ForwardReport) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create report directory '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write report to '{}'", self.path.display()))?;

        tracing::debug!("Wrote forward report to '{}'", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let r = ForwardReport::from_values("ndarray", [1, 2, 2], 3, &[-1.0, 0.0, 1.0, 2.0], Some(&[1.0, 0.999]));
        assert!(r.all_finite);
        assert_eq!(r.min, -1.0);
        assert_eq!(r.max, 2.0);
        assert!((r.mean - 0.5).abs() < 1e-6);
        assert!((r.max_alignment_deviation.unwrap() - 0.001).abs() < 1e-4);
    }

    #[test]
    fn test_nan_is_not_finite() {
        let r = ForwardReport::from_values("ndarray", [1, 1, 2], 1, &[0.0, f32::NAN], None);
        assert!(!r.all_finite);
        assert_eq!(r.max_alignment_deviation, None);
    }

    #[test]
    fn test_writer_round_trips_json() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("reports/forward.json"));
        let report = ForwardReport::from_values("ndarray", [2, 4, 8], 4, &[0.5; 64], Some(&[1.0; 8]));

        writer.write(&report).unwrap();

        let text   = fs::read_to_string(writer.path()).unwrap();
        let parsed: ForwardReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
        assert!(text.contains("\"steps\": 4"));
    }
}
