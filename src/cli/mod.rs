// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `demo`        — build the model, run one forward pass
//   2. `init-config` — write the model config as JSON
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use commands::{Commands, DemoArgs, InitConfigArgs};
use crate::ml::seq2seq::Seq2SeqConfig;

#[derive(Parser, Debug)]
#[command(
    name = "tensorshake",
    version = "0.1.0",
    about = "LSTM encoder-decoder with Luong / Bahdanau attention."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Demo(args)       => run_demo(args),
            Commands::InitConfig(args) => run_init_config(args),
        }
    }
}

fn run_demo(args: DemoArgs) -> Result<()> {
    use crate::application::forward_use_case::{BatchSource, ForwardConfig, ForwardUseCase};
    use crate::infra::config_store::load_config_file;

    let model = match &args.config {
        Some(path) => {
            tracing::info!("Loading model config from '{}'", path);
            load_config_file(path)?
        }
        None => Seq2SeqConfig::from(args.model.clone()),
    };

    let batch = match args.random_batch {
        Some(batch_size) => BatchSource::Random { batch_size, max_len: args.max_len },
        None             => BatchSource::Reference,
    };

    let use_case = ForwardUseCase::new(ForwardConfig {
        model,
        backend:     args.backend.into(),
        seed:        args.seed,
        batch,
        report_path: args.report.map(PathBuf::from),
    });
    let report = use_case.execute()?;

    println!("{}", report.summary_line());
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    use crate::application::config_use_case::ConfigUseCase;

    let config = Seq2SeqConfig::from(args.model);
    let path   = ConfigUseCase::new(&args.out).execute(&config)?;

    println!("Config written to {}", path.display());
    Ok(())
}
