//! Triangle wave generator.
use crate::chip::TriangleState;
use crate::chip::tables::TRIANGLE_SEQUENCE;

/// Triangle channel oscillator: a 32-step sequence clocked every CPU cycle.
///
/// The sequencer only moves while the channel is sounding and the output is
/// gated to 0 when it is not.
#[derive(Clone, Debug, Default)]
pub(crate) struct TriangleGenerator {
    timer: u16,
    step: u8,
    period: u16,
    running: bool,
}

impl TriangleGenerator {
    pub fn begin_tick(&mut self, state: &TriangleState) {
        self.period = state.period;
        self.running = state.is_sounding();
    }

    #[inline]
    pub fn tick(&mut self) -> u8 {
        if !self.running {
            return 0;
        }
        if self.timer == 0 {
            self.timer = self.period;
            self.step = (self.step + 1) & 31;
        } else {
            self.timer -= 1;
        }
        TRIANGLE_SEQUENCE[self.step as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweeps_the_full_range() {
        let mut state = TriangleState {
            enabled: true,
            ..TriangleState::default()
        };
        state.write(0, 0xFF);
        state.write(2, 10);
        state.write(3, 0x08);
        let mut generator = TriangleGenerator::default();
        generator.begin_tick(&state);
        let out: Vec<u8> = (0..32 * 11).map(|_| generator.tick()).collect();
        assert_eq!(out.iter().max(), Some(&15));
        assert_eq!(out.iter().min(), Some(&0));
    }
}
