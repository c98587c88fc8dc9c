//! Noise generator.
use crate::chip::NoiseState;
use crate::chip::tables::NOISE_PERIOD_TABLE;

/// Noise channel: a 15-bit LFSR clocked by a timer from the period table.
///
/// Feedback is bit 0 XOR bit 1 in long mode and bit 0 XOR bit 6 in short
/// mode, which yields a 93-step loop. The output is muted while bit 0 is
/// set.
#[derive(Clone, Debug)]
pub(crate) struct NoiseGenerator {
    timer: u16,
    lfsr: u16,
    period: u16,
    short_mode: bool,
    level: u8,
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self {
            timer: 0,
            lfsr: 1, // Must be non-zero
            period: NOISE_PERIOD_TABLE[0],
            short_mode: false,
            level: 0,
        }
    }
}

impl NoiseGenerator {
    pub fn begin_tick(&mut self, state: &NoiseState) {
        self.period = NOISE_PERIOD_TABLE[state.period_index() as usize];
        self.short_mode = state.mode();
        self.level = state.output_volume();
    }

    #[inline]
    pub fn tick(&mut self) -> u8 {
        if self.timer == 0 {
            self.timer = self.period - 1;
            let tap = if self.short_mode { 6 } else { 1 };
            let feedback = (self.lfsr ^ (self.lfsr >> tap)) & 1;
            self.lfsr = (self.lfsr >> 1) | (feedback << 14);
        } else {
            self.timer -= 1;
        }
        if self.lfsr & 1 == 0 { self.level } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence_length(short_mode: bool) -> usize {
        let mut generator = NoiseGenerator {
            short_mode,
            period: 1,
            ..NoiseGenerator::default()
        };
        let start = generator.lfsr;
        (1..=32767)
            .find(|_| {
                generator.tick();
                generator.lfsr == start
            })
            .unwrap_or(0)
    }

    #[test]
    fn long_and_short_loops() {
        assert_eq!(sequence_length(false), 32767);
        assert_eq!(sequence_length(true), 93);
    }
}
