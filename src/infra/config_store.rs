// ============================================================
// Layer 6 — Config Store
// ============================================================
// Saves and restores the model hyperparameters as JSON so a
// run can be reproduced with the same architecture:
//
//   <dir>/
//     seq2seq_config.json   ← Seq2SeqConfig (encoder + decoder)
//
// A loaded config is validated before it is returned, so a
// hand-edited file with mismatched attention flags fails here
// instead of at model construction.
//
// Reference: Burn Book §4 (Config)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::config::Config;
use std::{fs, path::{Path, PathBuf}};

use crate::ml::seq2seq::Seq2SeqConfig;

pub const CONFIG_FILE: &str = "seq2seq_config.json";

pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn save(&self, config: &Seq2SeqConfig) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create config directory '{}'", self.dir.display()))?;

        let path = self.path();
        config
            .save(&path)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved seq2seq config to '{}'", path.display());
        Ok(path)
    }

    pub fn load(&self) -> Result<Seq2SeqConfig> {
        load_config_file(self.path())
    }
}

/// Read and validate a config file at an arbitrary path.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<Seq2SeqConfig> {
    let path = path.as_ref();
    let config = Seq2SeqConfig::load(path)
        .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Config '{}' is not usable", path.display()))?;

    Ok(config)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kinds::AttentionType;

    #[test]
    fn test_save_then_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut config = Seq2SeqConfig::with_vocab(32);
        config.encoder.num_rnn_layers  = 3;
        config.decoder.attention_type  = AttentionType::Bahdanau;

        let path   = store.save(&config).unwrap();
        let loaded = store.load().unwrap();

        assert!(path.ends_with(CONFIG_FILE));
        assert_eq!(loaded.encoder.num_rnn_layers, 3);
        assert_eq!(loaded.decoder.attention_type, AttentionType::Bahdanau);
        assert_eq!(loaded.decoder.output_attention, None);
    }

    #[test]
    fn test_missing_file_mentions_path() {
        let dir   = tempfile::tempdir().unwrap();
        let err   = ConfigStore::new(dir.path()).load().unwrap_err();
        assert!(format!("{err:#}").contains(CONFIG_FILE));
    }

    #[test]
    fn test_mismatched_flags_fail_on_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut config = Seq2SeqConfig::with_vocab(8);
        config.decoder.add_attention = false;
        store.save(&config).unwrap();

        assert!(store.load().is_err());
    }

    #[test]
    fn test_unknown_attention_type_in_file_uses_crate_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.json");

        let json = Seq2SeqConfig::with_vocab(8)
            .to_string()
            .replace("\"luong\"", "\"dot\"");
        fs::write(&path, json).unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported attention type 'dot'"));
    }

    #[test]
    fn test_old_attention_spelling_loads() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");

        let json = Seq2SeqConfig::with_vocab(8)
            .to_string()
            .replace("\"luong\"", "\"bahdanaeu\"");
        fs::write(&path, json).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.decoder.attention_type, AttentionType::Bahdanau);
    }
}
