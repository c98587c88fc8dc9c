#![doc = include_str!("../README.md")]
//! famitrace: NES APU chip-music transcoder
//!
//! Modules follow the pipeline:
//! - `vgm`: event log codec, channel suppression and truncation
//! - `chip`: register model and the control-rate emulator
//! - `disasm`: per-channel note segmentation and canonical re-emission
//! - `score`: fixed-rate frame grids at three fidelities
//! - `synth`: waveform generation and WAV output
//! - `interchange`: multi-track note-event mapping of a score
//!
//! Every stage is a pure function of its input plus an explicit options
//! value; nothing is shared between tracks.
mod binutil;
pub mod chip;
pub mod disasm;
pub mod error;
pub mod interchange;
pub mod score;
pub mod synth;
pub(crate) mod textfmt;
pub mod vgm;

pub use error::{Error, Result};
