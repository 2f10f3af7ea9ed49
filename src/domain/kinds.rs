// ============================================================
// Layer 3 — Component Variants
// ============================================================
// The two places where the model is polymorphic:
//
//   RnnType       — which gated cell the recurrent stacks use
//   AttentionType — which scoring function attention uses
//
// Both are plain tagged enums picked once at construction.
// They serialise as lowercase strings so a saved config reads
// "attention_type": "luong".
//
// Reference: Luong et al. (2015) Effective Approaches to
//            Attention-based Neural Machine Translation
//            Bahdanau et al. (2015) Neural Machine Translation
//            by Jointly Learning to Align and Translate

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::Seq2SeqError;

// ─── RnnType ──────────────────────────────────────────────────────────────────
/// Recurrent cell family. Only LSTM gating is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RnnType {
    Lstm,
}

impl FromStr for RnnType {
    type Err = Seq2SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lstm" => Ok(Self::Lstm),
            _      => Err(Seq2SeqError::UnsupportedRnn(s.to_string())),
        }
    }
}

impl TryFrom<String> for RnnType {
    type Error = Seq2SeqError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for RnnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lstm => write!(f, "lstm"),
        }
    }
}

// ─── AttentionType ────────────────────────────────────────────────────────────
/// Attention scoring variant.
///
///   Luong    — multiplicative: score = keys · query
///   Bahdanau — additive:       score = v · tanh(keys + W·query)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AttentionType {
    Luong,
    Bahdanau,
}

impl AttentionType {
    /// Whether the decoder emits the attention vector (rather than the
    /// raw cell output) when the config does not say.
    pub fn outputs_attention_by_default(self) -> bool {
        matches!(self, Self::Luong)
    }
}

impl FromStr for AttentionType {
    type Err = Seq2SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "luong"                   => Ok(Self::Luong),
            "bahdanau" | "bahdanaeu"  => Ok(Self::Bahdanau),
            _                         => Err(Seq2SeqError::UnsupportedAttention(s.to_string())),
        }
    }
}

// Deserialisation goes through FromStr so config files accept the same
// names (including the old "bahdanaeu" spelling) and report the same error.
impl TryFrom<String> for AttentionType {
    type Error = Seq2SeqError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for AttentionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Luong    => write!(f, "luong"),
            Self::Bahdanau => write!(f, "bahdanau"),
        }
    }
}
