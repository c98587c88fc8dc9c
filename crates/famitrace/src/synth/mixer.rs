//! Nonlinear APU mixer and output filter.

/// Lookup tables for the two DAC curves of the APU.
///
/// The pulse pair and the triangle/noise/DMC group each drive their own
/// resistor network, so their sums are mixed through different curves.
#[derive(Clone, Debug)]
pub(crate) struct Mixer {
    /// Indexed by pulse1 + pulse2 (0-30).
    pulse: [f64; 31],
    /// Indexed by 3 * triangle + 2 * noise + dmc (0-202).
    tnd: [f64; 203],
}

impl Default for Mixer {
    fn default() -> Self {
        let mut pulse = [0.0; 31];
        for (n, out) in pulse.iter_mut().enumerate().skip(1) {
            *out = 95.52 / (8128.0 / n as f64 + 100.0);
        }
        let mut tnd = [0.0; 203];
        for (n, out) in tnd.iter_mut().enumerate().skip(1) {
            *out = 163.67 / (24329.0 / n as f64 + 100.0);
        }
        Self { pulse, tnd }
    }
}

impl Mixer {
    /// Mixed output in 0.0..1.0 for one CPU cycle.
    #[inline]
    pub fn mix(&self, pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> f64 {
        let p = (pulse1 + pulse2) as usize;
        let t = 3 * triangle as usize + 2 * noise as usize + dmc as usize;
        self.pulse[p.min(30)] + self.tnd[t.min(202)]
    }
}

/// First-order high-pass filter removing the mixer's DC offset.
#[derive(Clone, Debug, Default)]
pub(crate) struct DcBlocker {
    last_in: f64,
    last_out: f64,
}

impl DcBlocker {
    /// Pole position; a corner of roughly 35 Hz at 44.1 kHz.
    const POLE: f64 = 0.995;

    pub fn process(&mut self, sample: f64) -> f64 {
        let out = sample - self.last_in + Self::POLE * self.last_out;
        self.last_in = sample;
        self.last_out = out;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn curves_match_the_dac_formulas() {
        let mixer = Mixer::default();
        assert_eq!(mixer.mix(0, 0, 0, 0, 0), 0.0);
        assert_relative_eq!(mixer.mix(15, 15, 0, 0, 0), 95.52 / (8128.0 / 30.0 + 100.0));
        assert_relative_eq!(
            mixer.mix(0, 0, 15, 15, 127),
            163.67 / (24329.0 / 202.0 + 100.0)
        );
        assert!(mixer.mix(15, 15, 15, 15, 127) < 1.0);
    }

    #[test]
    fn dc_blocker_settles_to_zero() {
        let mut blocker = DcBlocker::default();
        let last = (0..5000).map(|_| blocker.process(0.5)).last().unwrap_or(1.0);
        assert!(last.abs() < 1e-6);
    }
}
