// ============================================================
// Layer 2 — Config Use Case
// ============================================================
// Workflow for `tensorshake init-config`: check the config the
// same way model construction would, then persist it.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::infra::config_store::ConfigStore;
use crate::ml::seq2seq::Seq2SeqConfig;

pub struct ConfigUseCase {
    store: ConfigStore,
}

impl ConfigUseCase {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { store: ConfigStore::new(dir) }
    }

    /// Validate and save. Returns the written file's path.
    pub fn execute(&self, config: &Seq2SeqConfig) -> Result<PathBuf> {
        config.validate().context("Refusing to save an invalid config")?;
        let path = self.store.save(config)?;
        tracing::info!("Config saved to '{}'", path.display());
        Ok(path)
    }
}
