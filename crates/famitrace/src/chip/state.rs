//! Per-tick register state of the APU.
//!
//! `RegisterState` is the authoritative reconstruction of all five channels
//! at one tick: the last byte written to every register plus the hardware
//! counters those bytes drive. It is mutated only through
//! [`ChipState::on_register_write`] and the frame-sequencer clocks invoked
//! by the emulator.
mod dmc;
mod noise;
mod pulse;
mod triangle;

pub use dmc::DmcState;
pub use noise::NoiseState;
pub use pulse::PulseState;
pub use triangle::TriangleState;

use super::channel::Channel;
use super::register::Register;

/// Register state tracking interface.
///
/// Separates the write/read surface used by the emulator and by `diff`
/// from the concrete channel layout.
pub trait ChipState {
    /// Apply one register write, including its immediate side effects.
    fn on_register_write(&mut self, register: Register, value: u8);

    /// Last byte written to `register`.
    fn read_register(&self, register: Register) -> u8;

    /// Return to power-on state.
    fn reset(&mut self);

    /// Whether `channel` is currently audible under the silence policy.
    fn is_sounding(&self, channel: Channel) -> bool;

    /// Number of channels the chip has.
    fn channel_count(&self) -> usize;
}

/// Volume envelope generator shared by the pulse and noise channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Envelope {
    pub divider: u8,
    pub decay: u8,
}

impl Envelope {
    /// Restart on a length-register write. Applied at once instead of at
    /// the next quarter frame.
    pub(crate) fn restart(&mut self, period: u8) {
        self.decay = 15;
        self.divider = period;
    }

    pub(crate) fn clock(&mut self, looping: bool, period: u8) {
        if self.divider > 0 {
            self.divider -= 1;
            return;
        }
        self.divider = period;
        if self.decay > 0 {
            self.decay -= 1;
        } else if looping {
            self.decay = 15;
        }
    }

    /// Volume reaching the channel output.
    pub fn level(&self, constant: bool, param: u8) -> u8 {
        if constant { param } else { self.decay }
    }
}

/// Snapshot of every APU register and derived counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterState {
    pub pulse1: PulseState,
    pub pulse2: PulseState,
    pub triangle: TriangleState,
    pub noise: NoiseState,
    pub dmc: DmcState,
    /// Last value written to $4015.
    pub status: u8,
    /// Last value written to $4017.
    pub frame_counter: u8,
    /// Bit `id` is set when register `id` was written during this tick.
    pub touched: u32,
    /// Writes applied during this tick, in arrival order.
    pub writes: Vec<(Register, u8)>,
}

impl Default for RegisterState {
    fn default() -> Self {
        Self {
            pulse1: PulseState::new(true),
            pulse2: PulseState::new(false),
            triangle: TriangleState::default(),
            noise: NoiseState::default(),
            dmc: DmcState::default(),
            status: 0,
            frame_counter: 0,
            touched: 0,
            writes: Vec::new(),
        }
    }
}

impl RegisterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `register` was written during this tick, even with its
    /// current value.
    pub fn was_touched(&self, register: Register) -> bool {
        self.touched & register.touch_bit() != 0
    }

    /// True when a DMC sample was (re)started during this tick.
    pub fn dmc_restarted(&self) -> bool {
        self.dmc.restarted
    }

    pub fn pulse(&self, channel: Channel) -> Option<&PulseState> {
        match channel {
            Channel::Pulse1 => Some(&self.pulse1),
            Channel::Pulse2 => Some(&self.pulse2),
            _ => None,
        }
    }

    /// Clear the per-tick markers before the next tick's writes.
    pub(crate) fn begin_tick(&mut self) {
        self.touched = 0;
        self.writes.clear();
        self.dmc.restarted = false;
    }

    pub(crate) fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_quarter();
        self.pulse2.clock_quarter();
        self.triangle.clock_quarter();
        self.noise.clock_quarter();
    }

    pub(crate) fn clock_half_frame(&mut self) {
        self.pulse1.clock_half();
        self.pulse2.clock_half();
        self.triangle.clock_half();
        self.noise.clock_half();
    }

    fn write_status(&mut self, value: u8) {
        self.status = value;
        self.pulse1.set_enabled(value & Channel::Pulse1.status_bit() != 0);
        self.pulse2.set_enabled(value & Channel::Pulse2.status_bit() != 0);
        self.triangle.set_enabled(value & Channel::Triangle.status_bit() != 0);
        self.noise.set_enabled(value & Channel::Noise.status_bit() != 0);
        self.dmc.set_enabled(value & Channel::Dmc.status_bit() != 0);
    }
}

impl ChipState for RegisterState {
    fn on_register_write(&mut self, register: Register, value: u8) {
        self.touched |= register.touch_bit();
        self.writes.push((register, value));
        let slot = register.slot();
        match register {
            Register::Pulse1Control
            | Register::Pulse1Sweep
            | Register::Pulse1TimerLow
            | Register::Pulse1TimerHigh => self.pulse1.write(slot, value),
            Register::Pulse2Control
            | Register::Pulse2Sweep
            | Register::Pulse2TimerLow
            | Register::Pulse2TimerHigh => self.pulse2.write(slot, value),
            Register::TriangleLinear | Register::TriangleTimerLow | Register::TriangleTimerHigh => {
                self.triangle.write(slot, value)
            }
            Register::NoiseControl | Register::NoisePeriod | Register::NoiseLength => {
                self.noise.write(slot, value)
            }
            Register::DmcControl
            | Register::DmcDirectLoad
            | Register::DmcAddress
            | Register::DmcLength => self.dmc.write(slot, value),
            Register::Status => self.write_status(value),
            Register::FrameCounter => self.frame_counter = value,
        }
    }

    fn read_register(&self, register: Register) -> u8 {
        let slot = register.slot();
        match register.channel() {
            Some(Channel::Pulse1) => self.pulse1.regs[slot],
            Some(Channel::Pulse2) => self.pulse2.regs[slot],
            Some(Channel::Triangle) => self.triangle.regs[slot],
            Some(Channel::Noise) => self.noise.regs[slot],
            Some(Channel::Dmc) => self.dmc.regs[slot],
            None if register == Register::Status => self.status,
            None => self.frame_counter,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn is_sounding(&self, channel: Channel) -> bool {
        match channel {
            Channel::Pulse1 => self.pulse1.is_sounding(),
            Channel::Pulse2 => self.pulse2.is_sounding(),
            Channel::Triangle => self.triangle.is_sounding(),
            Channel::Noise => self.noise.is_sounding(),
            Channel::Dmc => self.dmc.is_sounding(),
        }
    }

    fn channel_count(&self) -> usize {
        Channel::ALL.len()
    }
}
