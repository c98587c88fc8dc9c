//! APU register ids.
//!
//! Register ids are offsets from $4000 as they appear in `0xB4 aa dd`
//! event-log records. Pulse, triangle and noise registers share one layout:
//! the channel is `id >> 2` and the slot inside the channel is `id & 3`.
//!
//! | id   | register                                    |
//! |------|---------------------------------------------|
//! | 0x00 | Pulse 1 duty, length halt, volume/envelope  |
//! | 0x01 | Pulse 1 sweep                               |
//! | 0x02 | Pulse 1 timer low                           |
//! | 0x03 | Pulse 1 length load, timer high             |
//! | 0x04-0x07 | Pulse 2, same layout                   |
//! | 0x08 | Triangle linear counter                     |
//! | 0x0A | Triangle timer low                          |
//! | 0x0B | Triangle length load, timer high            |
//! | 0x0C | Noise length halt, volume/envelope          |
//! | 0x0E | Noise mode, period                          |
//! | 0x0F | Noise length load                           |
//! | 0x10 | DMC IRQ, loop, rate                         |
//! | 0x11 | DMC direct load                             |
//! | 0x12 | DMC sample address                          |
//! | 0x13 | DMC sample length                           |
//! | 0x15 | Status / channel enable                     |
//! | 0x17 | Frame counter                               |
use super::channel::Channel;
use crate::error::Error;

/// A defined APU register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Pulse1Control,
    Pulse1Sweep,
    Pulse1TimerLow,
    Pulse1TimerHigh,
    Pulse2Control,
    Pulse2Sweep,
    Pulse2TimerLow,
    Pulse2TimerHigh,
    TriangleLinear,
    TriangleTimerLow,
    TriangleTimerHigh,
    NoiseControl,
    NoisePeriod,
    NoiseLength,
    DmcControl,
    DmcDirectLoad,
    DmcAddress,
    DmcLength,
    Status,
    FrameCounter,
}

impl Register {
    /// Every defined register in id order.
    pub const ALL: [Register; 20] = [
        Register::Pulse1Control,
        Register::Pulse1Sweep,
        Register::Pulse1TimerLow,
        Register::Pulse1TimerHigh,
        Register::Pulse2Control,
        Register::Pulse2Sweep,
        Register::Pulse2TimerLow,
        Register::Pulse2TimerHigh,
        Register::TriangleLinear,
        Register::TriangleTimerLow,
        Register::TriangleTimerHigh,
        Register::NoiseControl,
        Register::NoisePeriod,
        Register::NoiseLength,
        Register::DmcControl,
        Register::DmcDirectLoad,
        Register::DmcAddress,
        Register::DmcLength,
        Register::Status,
        Register::FrameCounter,
    ];

    /// Raw register id (offset from $4000).
    pub fn id(self) -> u8 {
        match self {
            Register::Pulse1Control => 0x00,
            Register::Pulse1Sweep => 0x01,
            Register::Pulse1TimerLow => 0x02,
            Register::Pulse1TimerHigh => 0x03,
            Register::Pulse2Control => 0x04,
            Register::Pulse2Sweep => 0x05,
            Register::Pulse2TimerLow => 0x06,
            Register::Pulse2TimerHigh => 0x07,
            Register::TriangleLinear => 0x08,
            Register::TriangleTimerLow => 0x0A,
            Register::TriangleTimerHigh => 0x0B,
            Register::NoiseControl => 0x0C,
            Register::NoisePeriod => 0x0E,
            Register::NoiseLength => 0x0F,
            Register::DmcControl => 0x10,
            Register::DmcDirectLoad => 0x11,
            Register::DmcAddress => 0x12,
            Register::DmcLength => 0x13,
            Register::Status => 0x15,
            Register::FrameCounter => 0x17,
        }
    }

    /// Channel owning this register; `None` for status and frame counter.
    pub fn channel(self) -> Option<Channel> {
        match self.id() {
            0x00..=0x03 => Some(Channel::Pulse1),
            0x04..=0x07 => Some(Channel::Pulse2),
            0x08..=0x0B => Some(Channel::Triangle),
            0x0C..=0x0F => Some(Channel::Noise),
            0x10..=0x13 => Some(Channel::Dmc),
            _ => None,
        }
    }

    /// Slot of this register inside its channel's four-byte block.
    pub fn slot(self) -> usize {
        (self.id() & 0x03) as usize
    }

    /// The register at `slot` of `channel`, if that slot is defined.
    pub fn from_slot(channel: Channel, slot: usize) -> Option<Register> {
        let id = (channel.index() as u8) * 4 + slot as u8;
        Register::try_from(id).ok()
    }

    /// Writes to these registers restart hardware state even when the value
    /// is unchanged (length reload, envelope/phase restart, sweep divider
    /// reload, DAC level).
    pub fn has_side_effect(self) -> bool {
        matches!(
            self,
            Register::Pulse1Sweep
                | Register::Pulse2Sweep
                | Register::Pulse1TimerHigh
                | Register::Pulse2TimerHigh
                | Register::TriangleTimerHigh
                | Register::NoiseLength
                | Register::DmcDirectLoad
        )
    }

    /// The register whose write reloads the length counter of `channel`.
    pub fn length_load(channel: Channel) -> Option<Register> {
        match channel {
            Channel::Pulse1 => Some(Register::Pulse1TimerHigh),
            Channel::Pulse2 => Some(Register::Pulse2TimerHigh),
            Channel::Triangle => Some(Register::TriangleTimerHigh),
            Channel::Noise => Some(Register::NoiseLength),
            Channel::Dmc => None,
        }
    }

    /// Channel registers that only hold a value: rewriting the current
    /// value changes nothing.
    pub fn is_plain(self) -> bool {
        self.channel().is_some() && !self.has_side_effect()
    }

    /// Bit of this register in a `RegisterState::touched` mask.
    pub fn touch_bit(self) -> u32 {
        1 << self.id()
    }
}

impl TryFrom<u8> for Register {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Register::ALL
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or(Error::UnsupportedRegister {
                register: id,
                tick: 0,
            })
    }
}
