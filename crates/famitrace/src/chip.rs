//! NES APU model: channels, registers, per-tick register state and the
//! control-rate emulator that replays an event log into that state.
//!
//! The APU has five fixed channels:
//! - 2 pulse wave channels
//! - 1 triangle wave channel
//! - 1 noise channel
//! - 1 DMC (delta modulation channel) for samples
//!
//! FDS and other expansion audio is not modelled; writes to those register
//! ids are treated as unsupported and skipped.
pub mod channel;
pub mod emulator;
pub mod memory;
pub mod pitch;
pub mod register;
pub mod state;
pub(crate) mod tables;

pub use channel::{Channel, ChannelSet};
pub use emulator::{Timeline, diff, replay};
pub use memory::{RamBlock, SampleMemory};
pub use register::Register;
pub use state::{ChipState, DmcState, Envelope, NoiseState, PulseState, RegisterState, TriangleState};

/// NTSC 2A03 CPU clock in Hz (21,477,272 / 12).
pub const NTSC_CLOCK: u32 = 1_789_773;

/// Event-log tick rate: one tick is one VGM sample.
pub const TICK_RATE: u32 = 44_100;

/// CPU cycle position at the start of `tick` for the given clock.
///
/// Integer arithmetic keeps the mapping exact, so each tick owns either
/// 40 or 41 cycles at the NTSC clock and no drift accumulates.
pub fn cycle_at(tick: u64, clock: u32) -> u64 {
    tick * clock as u64 / TICK_RATE as u64
}
