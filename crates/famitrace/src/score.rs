//! Score builder: notes on a fixed-rate frame grid.
//!
//! A `Score` holds one `Frame` per frame period. Every frame carries the
//! voice of each pitched channel (or silence) and, on frames where a sample
//! starts, a DMC trigger. The same type serves every fidelity level; the
//! `Fidelity` value records which numeric policy produced it.
pub mod build;
pub mod fidelity;
pub mod resample;
pub mod text;

use std::fmt;
use std::str::FromStr;

use crate::chip::{Channel, NTSC_CLOCK, SampleMemory, TICK_RATE};
use crate::error::{Error, Result};

pub use build::{quantize, to_note_events};
pub use fidelity::{VELOCITY_LEVELS, expand_to_blended, reduce_to_quantized};
pub use resample::resample;

/// Numeric policy of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fidelity {
    /// Continuous pitch and velocity as sampled.
    #[default]
    Expressive,
    /// Pitch rounded to semitones, velocity on `VELOCITY_LEVELS`.
    Quantized,
    /// Continuous pitch, velocity on `VELOCITY_LEVELS`.
    Blended,
}

impl Fidelity {
    pub fn name(self) -> &'static str {
        match self {
            Fidelity::Expressive => "expressive",
            Fidelity::Quantized => "quantized",
            Fidelity::Blended => "blended",
        }
    }
}

impl fmt::Display for Fidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fidelity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        [Fidelity::Expressive, Fidelity::Quantized, Fidelity::Blended]
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown fidelity '{s}'"))
    }
}

/// A validated frame rate in frames per second.
///
/// Rates are positive, finite and no faster than the tick rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate(f64);

impl FrameRate {
    pub fn new(fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 || fps > TICK_RATE as f64 {
            return Err(Error::range(
                "frame rate",
                format!("{fps} is not in (0, {TICK_RATE}]"),
            ));
        }
        Ok(Self(fps))
    }

    pub fn fps(self) -> f64 {
        self.0
    }

    /// Length of one frame in ticks.
    pub fn ticks_per_frame(self) -> f64 {
        TICK_RATE as f64 / self.0
    }

    /// First tick of `frame`.
    pub fn frame_start(self, frame: usize) -> u64 {
        (frame as f64 * self.ticks_per_frame()).round() as u64
    }

    /// Tick at the centre of `frame`.
    pub fn frame_centre(self, frame: usize) -> u64 {
        ((frame as f64 + 0.5) * self.ticks_per_frame()).floor() as u64
    }

    /// Frames needed to cover `length` ticks.
    pub fn frame_count(self, length: u64) -> usize {
        let frames = length as f64 / self.ticks_per_frame();
        (frames - 1e-9).ceil().max(0.0) as usize
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sounding state of a pitched channel during one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchedVoice {
    /// Semitones (MIDI numbering) for tonal channels, period index for
    /// noise.
    pub pitch: f64,
    /// 0-15.
    pub velocity: f64,
    pub timbre: u8,
    /// A note starts in this frame.
    pub onset: bool,
}

/// A DMC sample started in this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTrigger {
    pub address: u16,
    pub length: u16,
    /// DMC control byte: loop flag and rate index.
    pub control: u8,
    /// Direct-load level >> 3.
    pub level: u8,
}

/// One frame of a score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Indexed by `Channel::index()` of the pitched channels.
    pub voices: [Option<PitchedVoice>; 4],
    pub dmc: Option<SampleTrigger>,
}

impl Frame {
    pub fn voice(&self, channel: Channel) -> Option<&PitchedVoice> {
        self.voices.get(channel.index()).and_then(Option::as_ref)
    }

    pub fn is_silent(&self) -> bool {
        self.voices.iter().all(Option::is_none) && self.dmc.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub rate: FrameRate,
    pub fidelity: Fidelity,
    /// APU clock the pitches were derived with.
    pub clock: u32,
    /// Track length in ticks.
    pub length_ticks: u64,
    pub frames: Vec<Frame>,
    pub samples: SampleMemory,
}

impl Score {
    /// An all-silent score covering `length_ticks`.
    pub fn silent(rate: FrameRate, length_ticks: u64) -> Self {
        Self {
            rate,
            fidelity: Fidelity::Expressive,
            clock: NTSC_CLOCK,
            length_ticks,
            frames: vec![Frame::default(); rate.frame_count(length_ticks)],
            samples: SampleMemory::new(),
        }
    }
}
