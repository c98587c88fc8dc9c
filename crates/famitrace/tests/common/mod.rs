//! Logs shared by the integration tests.
#![allow(dead_code)]

use famitrace::chip::{NTSC_CLOCK, RamBlock, Register};
use famitrace::vgm::{EventLog, EventLogBuilder};

/// Address of the DMC sample in `five_channel_log`.
pub const SAMPLE_ADDRESS: u16 = 0xC000;

/// A single Pulse 1 note: period 253, duty 2, full volume, `ticks` long.
pub fn pulse_note_log(ticks: u32) -> EventLog {
    let mut builder = EventLogBuilder::new(NTSC_CLOCK);
    builder
        .write(Register::Status, 0x01)
        .write(Register::Pulse1Control, 0xBF)
        .write(Register::Pulse1Sweep, 0x08)
        .write(Register::Pulse1TimerLow, 0xFD)
        .write(Register::Pulse1TimerHigh, 0x08)
        .wait(ticks);
    builder.finish()
}

/// Two passages of 2000 ticks each.
///
/// The first plays both pulses and the triangle; Pulse 1 drops to volume 8
/// at tick 500 and Pulse 2 slides from period 0x152 to 0x140 at tick 1000.
/// The second plays only noise and a 17-byte DMC sample.
pub fn five_channel_log() -> EventLog {
    let mut builder = EventLogBuilder::new(NTSC_CLOCK);
    builder
        .ram(RamBlock {
            address: SAMPLE_ADDRESS,
            data: (0..17u8).map(|i| i.wrapping_mul(37) ^ 0xA5).collect(),
        })
        .write(Register::Status, 0x07)
        .write(Register::Pulse1Control, 0xBF)
        .write(Register::Pulse1Sweep, 0x08)
        .write(Register::Pulse1TimerLow, 0xFD)
        .write(Register::Pulse1TimerHigh, 0x08)
        .write(Register::Pulse2Control, 0x7A)
        .write(Register::Pulse2Sweep, 0x08)
        .write(Register::Pulse2TimerLow, 0x52)
        .write(Register::Pulse2TimerHigh, 0x09)
        .write(Register::TriangleLinear, 0xFF)
        .write(Register::TriangleTimerLow, 0x80)
        .write(Register::TriangleTimerHigh, 0x09)
        .wait(500)
        .write(Register::Pulse1Control, 0xB8)
        .wait(500)
        .write(Register::Pulse2TimerLow, 0x40)
        .wait(1000)
        .write(Register::NoiseControl, 0x3C)
        .write(Register::NoisePeriod, 0x05)
        .write(Register::DmcControl, 0x0F)
        .write(Register::DmcAddress, 0x00)
        .write(Register::DmcLength, 0x01)
        .write(Register::DmcDirectLoad, 0x40)
        .write(Register::Status, 0x18)
        .write(Register::NoiseLength, 0x08)
        .wait(2000);
    builder.finish()
}
