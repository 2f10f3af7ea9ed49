#![recursion_limit = "256"]

//! LSTM sequence-to-sequence model with Luong and Bahdanau attention,
//! built on Burn. Layers, top to bottom:
//!
//!   cli → application → ml → infra, with domain shared by all.

pub mod cli;
pub mod application;
pub mod domain;
pub mod ml;
pub mod infra;
