//! Synthesizer: register state to 16-bit PCM.
//!
//! Each tick's register state drives five oscillators clocked at the CPU
//! rate. The nonlinear mix of every CPU cycle is averaged over the tick,
//! which box-filters the output down to one sample per tick at 44,100 Hz.
//!
//! ```
//! use famitrace::chip::{Register, replay};
//! use famitrace::synth::{SynthOptions, render};
//! use famitrace::vgm::EventLogBuilder;
//!
//! let mut builder = EventLogBuilder::new(famitrace::chip::NTSC_CLOCK);
//! builder
//!     .write(Register::Status, 0x01)
//!     .write(Register::Pulse1Control, 0xBF)
//!     .write(Register::Pulse1TimerLow, 0xFD)
//!     .write(Register::Pulse1TimerHigh, 0x08)
//!     .wait(441);
//! let pcm = render(&replay(&builder.finish()), &SynthOptions::default());
//! assert_eq!(pcm.len(), 441);
//! assert!(pcm.iter().any(|&s| s > 0));
//! ```
mod dmc;
mod mixer;
mod noise;
mod pulse;
mod triangle;
pub mod wav;

use crate::chip::{Register, RegisterState, Timeline, cycle_at};
use dmc::DmcGenerator;
use mixer::{DcBlocker, Mixer};
use noise::NoiseGenerator;
use pulse::PulseGenerator;
use triangle::TriangleGenerator;

pub use wav::{SAMPLE_RATE, wav_bytes, write_wav};

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SynthOptions {
    /// Run the output through a DC-blocking high-pass filter. Without it
    /// the waveform sits on the mixer's positive offset.
    pub dc_block: bool,
}

/// APU sound generator fed one `RegisterState` per tick.
#[derive(Debug, Clone)]
pub struct Synth {
    clock: u32,
    tick: u64,
    pulse1: PulseGenerator,
    pulse2: PulseGenerator,
    triangle: TriangleGenerator,
    noise: NoiseGenerator,
    dmc: DmcGenerator,
    mixer: Mixer,
    dc_blocker: Option<DcBlocker>,
}

impl Synth {
    /// A generator for a chip running at `clock` Hz with the given sample
    /// image of $8000-$FFFF.
    pub fn new(clock: u32, sample_image: Vec<u8>, options: &SynthOptions) -> Self {
        Self {
            clock,
            tick: 0,
            pulse1: PulseGenerator::default(),
            pulse2: PulseGenerator::default(),
            triangle: TriangleGenerator::default(),
            noise: NoiseGenerator::default(),
            dmc: DmcGenerator::new(sample_image),
            mixer: Mixer::default(),
            dc_blocker: options.dc_block.then(DcBlocker::default),
        }
    }

    /// Render the next tick.
    pub fn render_tick(&mut self, state: &RegisterState) -> i16 {
        self.pulse1
            .begin_tick(&state.pulse1, state.was_touched(Register::Pulse1TimerHigh));
        self.pulse2
            .begin_tick(&state.pulse2, state.was_touched(Register::Pulse2TimerHigh));
        self.triangle.begin_tick(&state.triangle);
        self.noise.begin_tick(&state.noise);
        self.dmc.begin_tick(state);

        let cycles = cycle_at(self.tick + 1, self.clock) - cycle_at(self.tick, self.clock);
        self.tick += 1;
        let mut sum = 0.0;
        for _ in 0..cycles {
            sum += self.mixer.mix(
                self.pulse1.tick(),
                self.pulse2.tick(),
                self.triangle.tick(),
                self.noise.tick(),
                self.dmc.tick(),
            );
        }
        let mut sample = if cycles > 0 { sum / cycles as f64 } else { 0.0 };
        sample = match self.dc_blocker.as_mut() {
            Some(blocker) => blocker.process(sample).clamp(-1.0, 1.0),
            None => sample.clamp(0.0, 1.0),
        };
        (sample * i16::MAX as f64) as i16
    }
}

/// Render a whole timeline, one sample per tick.
pub fn render(timeline: &Timeline, options: &SynthOptions) -> Vec<i16> {
    let mut synth = Synth::new(timeline.clock, timeline.samples.image(), options);
    let pcm: Vec<i16> = timeline
        .states
        .iter()
        .map(|state| synth.render_tick(state))
        .collect();
    tracing::trace!(samples = pcm.len(), dc_block = options.dc_block, "rendered timeline");
    pcm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{NTSC_CLOCK, replay};
    use crate::vgm::EventLogBuilder;

    #[test]
    fn silence_renders_zero() {
        let mut builder = EventLogBuilder::new(NTSC_CLOCK);
        builder.wait(100);
        let pcm = render(&replay(&builder.finish()), &SynthOptions::default());
        assert_eq!(pcm, vec![0; 100]);
    }

    #[test]
    fn dc_blocker_centres_a_held_level() {
        let mut builder = EventLogBuilder::new(NTSC_CLOCK);
        builder.write(Register::DmcDirectLoad, 0x7F).wait(10_000);
        let log = builder.finish();
        let plain = render(&replay(&log), &SynthOptions::default());
        let blocked = render(&replay(&log), &SynthOptions { dc_block: true });
        assert!(plain[9_999] > 1000);
        assert!(blocked[9_999].abs() < 10);
    }
}
