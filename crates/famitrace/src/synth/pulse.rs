//! Pulse wave generator.
use crate::chip::PulseState;
use crate::chip::tables::PULSE_DUTY;

/// Pulse channel oscillator.
///
/// The timer is clocked every second CPU cycle and steps an 8-step duty
/// sequence each time it expires, so the output frequency is
/// `clock / (16 * (period + 1))`.
#[derive(Clone, Debug, Default)]
pub(crate) struct PulseGenerator {
    timer: u16,
    step: u8,
    /// Odd CPU cycle within the timer's two-cycle clock.
    odd_cycle: bool,
    // Control values latched at the start of the tick.
    period: u16,
    duty: u8,
    level: u8,
}

impl PulseGenerator {
    /// Latch the tick's control state. `restart` is a write to the length
    /// register, which resets the sequencer phase.
    pub fn begin_tick(&mut self, state: &PulseState, restart: bool) {
        if restart {
            self.step = 0;
        }
        self.period = state.period;
        self.duty = state.duty();
        self.level = state.output_volume();
    }

    /// Advance one CPU cycle and return the channel output (0-15).
    #[inline]
    pub fn tick(&mut self) -> u8 {
        self.odd_cycle = !self.odd_cycle;
        if self.odd_cycle {
            if self.timer == 0 {
                self.timer = self.period;
                self.step = (self.step + 1) & 7;
            } else {
                self.timer -= 1;
            }
        }
        PULSE_DUTY[self.duty as usize][self.step as usize] * self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(period: u16, duty: u8) -> PulseState {
        let mut state = PulseState::new(true);
        state.enabled = true;
        state.write(0, (duty << 6) | 0x3F);
        state.write(1, 0x08);
        state.write(2, (period & 0xFF) as u8);
        state.write(3, ((period >> 8) as u8) | 0x08);
        state
    }

    #[test]
    fn period_sets_cycle_length() {
        let mut generator = PulseGenerator::default();
        generator.begin_tick(&playing(100, 2), true);
        // Eight steps of 101 timer clocks, two CPU cycles each.
        let sequence = 8 * 101 * 2;
        let out: Vec<u8> = (0..sequence * 3).map(|_| generator.tick()).collect();
        let rising = out.windows(2).filter(|w| w[0] == 0 && w[1] > 0).count();
        assert_eq!(rising, 2);
        assert!(out.iter().all(|&v| v == 0 || v == 15));
    }

    #[test]
    fn silent_channel_outputs_zero() {
        let mut state = playing(100, 2);
        state.enabled = false;
        let mut generator = PulseGenerator::default();
        generator.begin_tick(&state, false);
        assert!((0..1000).all(|_| generator.tick() == 0));
    }
}
