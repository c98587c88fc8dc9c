//! Timer period / frequency / semitone conversions for the tonal channels.
//!
//! Pulse channels produce `clock / (16 * (period + 1))` Hz; the triangle
//! runs its 32-step sequence off the CPU clock directly, which lands one
//! octave lower: `clock / (32 * (period + 1))` Hz.
//!
//! Semitone numbers follow the MIDI convention (A4 = 69 = 440 Hz) but are
//! kept as `f64` so bends and detuned periods survive the conversion.
//!
//! ```rust
//! use famitrace::chip::pitch::{period_to_semitone, semitone_to_period};
//! use famitrace::chip::{Channel, NTSC_CLOCK};
//!
//! let pitch = period_to_semitone(Channel::Pulse1, 253, NTSC_CLOCK);
//! assert!((pitch - 69.0).abs() < 0.05);
//! assert_eq!(semitone_to_period(Channel::Pulse1, pitch, NTSC_CLOCK), 253);
//! ```
use super::channel::Channel;

/// Reference A4 frequency.
const A4_HZ: f64 = 440.0;
/// Semitone number of A4.
const A4_SEMITONE: f64 = 69.0;
/// Largest 11-bit timer period.
pub const MAX_PERIOD: u16 = 0x7FF;

fn divider(channel: Channel) -> f64 {
    match channel {
        Channel::Triangle => 32.0,
        _ => 16.0,
    }
}

/// Frequency in Hz produced by `period` on a pulse or triangle channel.
pub fn period_to_hz(channel: Channel, period: u16, clock: u32) -> f64 {
    clock as f64 / (divider(channel) * (period as f64 + 1.0))
}

/// Nearest timer period for `hz`, clamped to the 11-bit range.
pub fn hz_to_period(channel: Channel, hz: f64, clock: u32) -> u16 {
    if hz <= 0.0 {
        return MAX_PERIOD;
    }
    let period = (clock as f64 / (divider(channel) * hz) - 1.0).round();
    period.clamp(0.0, MAX_PERIOD as f64) as u16
}

/// Convert a frequency to a (fractional) semitone number.
pub fn hz_to_semitone(hz: f64) -> f64 {
    A4_SEMITONE + 12.0 * (hz / A4_HZ).log2()
}

/// Convert a (fractional) semitone number to a frequency.
pub fn semitone_to_hz(semitone: f64) -> f64 {
    A4_HZ * 2f64.powf((semitone - A4_SEMITONE) / 12.0)
}

/// Semitone number sounded by `period` on a pulse or triangle channel.
pub fn period_to_semitone(channel: Channel, period: u16, clock: u32) -> f64 {
    hz_to_semitone(period_to_hz(channel, period, clock))
}

/// Timer period closest to `semitone` on a pulse or triangle channel.
///
/// Exact inverse of [`period_to_semitone`] for any 11-bit period.
pub fn semitone_to_period(channel: Channel, semitone: f64, clock: u32) -> u16 {
    hz_to_period(channel, semitone_to_hz(semitone), clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::NTSC_CLOCK;
    use approx::assert_relative_eq;

    #[test]
    fn triangle_is_an_octave_below_pulse() {
        let pulse = period_to_hz(Channel::Pulse1, 400, NTSC_CLOCK);
        let tri = period_to_hz(Channel::Triangle, 400, NTSC_CLOCK);
        assert_relative_eq!(pulse, tri * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn every_period_survives_semitone_round_trip() {
        for ch in [Channel::Pulse2, Channel::Triangle] {
            for period in 0..=MAX_PERIOD {
                let st = period_to_semitone(ch, period, NTSC_CLOCK);
                assert_eq!(semitone_to_period(ch, st, NTSC_CLOCK), period);
            }
        }
    }

    #[test]
    fn out_of_range_frequencies_clamp() {
        assert_eq!(hz_to_period(Channel::Pulse1, 1.0, NTSC_CLOCK), MAX_PERIOD);
        assert_eq!(hz_to_period(Channel::Pulse1, 1.0e9, NTSC_CLOCK), 0);
        assert_eq!(hz_to_period(Channel::Pulse1, 0.0, NTSC_CLOCK), MAX_PERIOD);
    }
}
