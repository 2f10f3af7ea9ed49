// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `demo` and `init-config`, and
// the model flags they share.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, AttentionType, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::domain::kinds::{AttentionType, RnnType};
use crate::ml::{
    decoder::DecoderConfig,
    encoder::EncoderConfig,
    runner::ComputeBackend,
    seq2seq::Seq2SeqConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the model and run one forward pass
    Demo(DemoArgs),

    /// Write the model config as JSON
    InitConfig(InitConfigArgs),
}

/// Hyperparameters shared by both sides of the model.
/// The derived `ModelArgs` group lets `--config` exclude them.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Vocabulary size (used by encoder and decoder)
    #[arg(long, default_value_t = 4)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 128)]
    pub embedding_dim: usize,

    /// Hidden width of every LSTM layer
    #[arg(long, default_value_t = 128)]
    pub rnn_hidden_dim: usize,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 1)]
    pub num_rnn_layers: usize,

    /// Attention vector width (must equal --rnn-hidden-dim for luong)
    #[arg(long, default_value_t = 128)]
    pub attention_hidden_dims: usize,

    /// luong or bahdanau
    #[arg(long, default_value = "luong")]
    pub attention_type: AttentionType,

    #[arg(long, default_value = "lstm")]
    pub rnn_type: RnnType,

    /// Run both halves without attention
    #[arg(long)]
    pub no_attention: bool,

    /// Encode in one direction only
    #[arg(long)]
    pub unidirectional: bool,

    /// Feed the source in its original order
    #[arg(long)]
    pub no_reverse: bool,

    /// Residual connections between encoder layers
    #[arg(long)]
    pub skip_connections: bool,
}

/// Convert CLI model flags into the model config.
/// The decoder's memory width is derived from the encoder here
/// and again at model construction.
impl From<ModelArgs> for Seq2SeqConfig {
    fn from(a: ModelArgs) -> Self {
        let encoder = EncoderConfig::new(a.vocab_size)
            .with_embedding_dim(a.embedding_dim)
            .with_rnn_hidden_dim(a.rnn_hidden_dim)
            .with_rnn_type(a.rnn_type)
            .with_num_rnn_layers(a.num_rnn_layers)
            .with_bidirectional(!a.unidirectional)
            .with_reverse_sequence(!a.no_reverse)
            .with_skip_connections(a.skip_connections)
            .with_add_attention(!a.no_attention);

        let decoder = DecoderConfig::new(a.vocab_size)
            .with_embedding_dim(a.embedding_dim)
            .with_rnn_hidden_dim(a.rnn_hidden_dim)
            .with_attention_hidden_dims(a.attention_hidden_dims)
            .with_rnn_type(a.rnn_type)
            .with_add_attention(!a.no_attention)
            .with_attention_type(a.attention_type)
            .with_memory_dim(encoder.output_dim());

        Seq2SeqConfig::new(encoder, decoder)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// CPU
    Ndarray,
    /// GPU via WGPU
    Wgpu,
}

impl From<BackendArg> for ComputeBackend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Ndarray => ComputeBackend::NdArray,
            BackendArg::Wgpu    => ComputeBackend::Wgpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Load the model config from this JSON file instead of the flags
    #[arg(long, conflicts_with = "ModelArgs")]
    pub config: Option<String>,

    #[arg(long, value_enum, default_value_t = BackendArg::Ndarray)]
    pub backend: BackendArg,

    /// Seed for weight initialisation and random batches
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Use N random sequences instead of the reference pair
    #[arg(long)]
    pub random_batch: Option<usize>,

    /// Longest random sequence
    #[arg(long, default_value_t = 8)]
    pub max_len: usize,

    /// Also write the report as JSON to this file
    #[arg(long)]
    pub report: Option<String>,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Directory to write seq2seq_config.json into
    #[arg(long, default_value = "config")]
    pub out: String,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn model_args(argv: &[&str]) -> ModelArgs {
        let mut full = vec!["tensorshake", "init-config"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::InitConfig(args) => args.model,
            Commands::Demo(_)          => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_defaults_map_to_reference_config() {
        let config: Seq2SeqConfig = model_args(&[]).into();
        assert_eq!(config.encoder.vocab_size, 4);
        assert!(config.encoder.bidirectional);
        assert!(config.encoder.add_attention && config.decoder.add_attention);
        assert_eq!(config.decoder.memory_dim, 256);
        assert_eq!(config.decoder.attention_type, AttentionType::Luong);
    }

    #[test]
    fn test_flags_flow_into_both_halves() {
        let config: Seq2SeqConfig = model_args(&[
            "--no-attention",
            "--unidirectional",
            "--rnn-hidden-dim", "32",
            "--attention-type", "bahdanaeu",
        ])
        .into();

        assert!(!config.encoder.add_attention && !config.decoder.add_attention);
        assert!(!config.encoder.bidirectional);
        assert_eq!(config.decoder.memory_dim, 32);
        assert_eq!(config.decoder.attention_type, AttentionType::Bahdanau);
    }

    #[test]
    fn test_unknown_attention_type_is_rejected() {
        let parsed = Cli::try_parse_from(["tensorshake", "demo", "--attention-type", "dot"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_config_file_excludes_model_flags() {
        let parsed = Cli::try_parse_from(["tensorshake", "demo", "--config", "c.json", "--vocab-size", "9"]);
        assert!(parsed.is_err());

        let cli = Cli::parse_from(["tensorshake", "demo", "--config", "c.json", "--seed", "3"]);
        let Commands::Demo(args) = cli.command else { panic!("expected demo") };
        assert_eq!(args.config.as_deref(), Some("c.json"));
    }

    #[test]
    fn test_demo_backend_and_random_batch() {
        let cli = Cli::parse_from(["tensorshake", "demo", "--backend", "wgpu", "--random-batch", "5"]);
        let Commands::Demo(args) = cli.command else { panic!("expected demo") };
        assert_eq!(ComputeBackend::from(args.backend), ComputeBackend::Wgpu);
        assert_eq!(args.random_batch, Some(5));
    }
}
