//! Control-rate APU emulator.
//!
//! `replay` turns an event log into one `RegisterState` snapshot per tick;
//! `diff` turns such a sequence back into an event log. Writes land at the
//! start of their tick, then the frame sequencer and the DMC byte counter
//! advance by the CPU cycles that tick owns.
use super::memory::SampleMemory;
use super::register::Register;
use super::state::{ChipState, RegisterState};
use super::tables::{FRAME_4STEP, FRAME_4STEP_RESET, FRAME_5STEP, FRAME_5STEP_RESET};
use super::{NTSC_CLOCK, cycle_at};
use crate::error::Error;
use crate::vgm::{Command, EventLog, EventLogBuilder};

/// Per-tick register state of a whole track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    /// APU master clock in Hz.
    pub clock: u32,
    /// `states[t]` is the register state during tick `t`.
    pub states: Vec<RegisterState>,
    /// DMC sample memory.
    pub samples: SampleMemory,
    /// Loop point carried as metadata.
    pub loop_tick: Option<u64>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            clock: NTSC_CLOCK,
            states: Vec::new(),
            samples: SampleMemory::new(),
            loop_tick: None,
        }
    }
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// `(tick, state)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &RegisterState)> {
        self.states.iter().enumerate().map(|(t, s)| (t as u64, s))
    }
}

/// Frame sequencer: clocks envelopes and the linear counter on quarter
/// frames, length counters and sweep on half frames.
#[derive(Debug, Clone, Default)]
struct FrameSequencer {
    five_step: bool,
    cycle: u32,
}

impl FrameSequencer {
    /// A $4017 write restarts the sequence; 5-step mode clocks both units
    /// immediately.
    fn reset(&mut self, state: &mut RegisterState, value: u8) {
        self.five_step = value & 0x80 != 0;
        self.cycle = 0;
        if self.five_step {
            state.clock_quarter_frame();
            state.clock_half_frame();
        }
    }

    fn advance(&mut self, state: &mut RegisterState, mut cycles: u32) {
        let (points, reset) = if self.five_step {
            (&FRAME_5STEP, FRAME_5STEP_RESET)
        } else {
            (&FRAME_4STEP, FRAME_4STEP_RESET)
        };
        while cycles > 0 {
            let next = points
                .iter()
                .copied()
                .find(|&p| p > self.cycle)
                .unwrap_or(reset);
            let step = (next - self.cycle).min(cycles);
            self.cycle += step;
            cycles -= step;
            if let Some(index) = points.iter().position(|&p| p == self.cycle) {
                state.clock_quarter_frame();
                // Steps 1 and 3 are half frames in both modes.
                if index % 2 == 1 {
                    state.clock_half_frame();
                }
            }
            if self.cycle >= reset {
                self.cycle = 0;
            }
        }
    }
}

/// Replay an event log into one register snapshot per tick.
///
/// Snapshots run from tick 0 to the tick before the stream end; writes
/// after the final wait belong to no tick and are not observed. Writes to
/// undefined registers are logged and skipped.
pub fn replay(log: &EventLog) -> Timeline {
    let clock = log.clock();
    let mut state = RegisterState::new();
    let mut sequencer = FrameSequencer::default();
    let mut samples = SampleMemory::new();
    let mut states = Vec::with_capacity(log.total_ticks() as usize);
    let mut tick = 0u64;
    let mut ignored = 0usize;

    for command in log {
        match command {
            Command::Write { register, value } => {
                state.on_register_write(*register, *value);
                if *register == Register::FrameCounter {
                    sequencer.reset(&mut state, *value);
                }
            }
            Command::Unsupported { register, .. } => {
                let err = Error::UnsupportedRegister {
                    register: *register,
                    tick,
                };
                tracing::debug!(%err, "ignoring write");
                ignored += 1;
            }
            Command::RamWrite(block) => samples.push(block.clone()),
            Command::Wait(n) => {
                for _ in 0..*n {
                    states.push(state.clone());
                    state.begin_tick();
                    let cycles = (cycle_at(tick + 1, clock) - cycle_at(tick, clock)) as u32;
                    sequencer.advance(&mut state, cycles);
                    state.dmc.advance(cycles);
                    tick += 1;
                }
            }
            Command::End => break,
        }
    }

    tracing::trace!(ticks = states.len(), ignored, "replayed event log");
    Timeline {
        clock,
        states,
        samples,
        loop_tick: log.loop_tick(),
    }
}

/// Writes that move the chip from `prev` to `next` within one tick.
///
/// The tick's recorded writes keep their arrival order: a length load ahead
/// of the status write enabling its channel is lost, and one ahead of a
/// 5-step frame counter write is clocked at once. A plain register
/// rewritten with the value it holds is dropped, as is an exact repeat of
/// the write just emitted. Registers that moved without a recorded write
/// follow in register order.
fn tick_writes(prev: &RegisterState, next: &RegisterState, out: &mut Vec<(Register, u8)>) {
    let mut current = [0u8; 0x18];
    for register in Register::ALL {
        current[register.id() as usize] = prev.read_register(register);
    }
    for &(register, value) in &next.writes {
        let slot = &mut current[register.id() as usize];
        let unchanged = register.is_plain() && *slot == value;
        // A second $4017 write restarts the sequencer again.
        let repeated =
            register != Register::FrameCounter && out.last() == Some(&(register, value));
        if unchanged || repeated {
            continue;
        }
        *slot = value;
        out.push((register, value));
    }
    for register in Register::ALL {
        let value = next.read_register(register);
        if current[register.id() as usize] != value {
            out.push((register, value));
        }
    }
}

/// Rebuild an event log from a timeline.
///
/// Plain channel registers are written only when their value changes.
/// Writes that restart hardware state (length loads, sweep reloads, DMC
/// direct load, status, frame counter) are emitted whenever they were
/// touched, in the order they arrived. Waits accumulate across unchanged
/// ticks.
pub fn diff(timeline: &Timeline) -> EventLog {
    let mut builder = EventLogBuilder::new(timeline.clock);
    for block in timeline.samples.blocks() {
        builder.ram(block.clone());
    }

    let initial = RegisterState::new();
    let mut prev = &initial;
    let mut writes = Vec::new();
    for (tick, state) in timeline.iter() {
        if Some(tick) == timeline.loop_tick {
            builder.mark_loop();
        }
        writes.clear();
        tick_writes(prev, state, &mut writes);
        for &(register, value) in &writes {
            builder.write(register, value);
        }
        builder.wait(1);
        prev = state;
    }
    if timeline.loop_tick == Some(timeline.len() as u64) {
        builder.mark_loop();
    }
    let log = builder.finish();
    tracing::trace!(records = log.commands().len(), "diffed timeline");
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    /// States with the per-tick write markers cleared; coalesced writes
    /// legitimately leave fewer marks behind.
    fn settled(timeline: &Timeline) -> Vec<RegisterState> {
        timeline
            .states
            .iter()
            .cloned()
            .map(|mut s| {
                s.touched = 0;
                s.writes.clear();
                s
            })
            .collect()
    }

    fn log_of(build: impl FnOnce(&mut EventLogBuilder)) -> EventLog {
        let mut builder = EventLogBuilder::new(NTSC_CLOCK);
        build(&mut builder);
        builder.finish()
    }

    #[test]
    fn one_snapshot_per_tick() {
        let log = log_of(|b| {
            b.write(Register::Status, 0x01).wait(3).write(Register::Pulse1Control, 0x3F);
        });
        let timeline = replay(&log);
        assert_eq!(timeline.len(), 3);
        // Trailing write after the final wait is not observed.
        assert!(timeline.states.iter().all(|s| s.pulse1.regs[0] == 0));
        assert!(timeline.states[0].was_touched(Register::Status));
        assert!(!timeline.states[1].was_touched(Register::Status));
    }

    #[test]
    fn length_counter_expires_on_half_frames() {
        // Length index 3 loads 2; two half frames silence the channel.
        let log = log_of(|b| {
            b.write(Register::Status, 0x01)
                .write(Register::Pulse1Control, 0x1F)
                .write(Register::Pulse1TimerLow, 0x00)
                .write(Register::Pulse1TimerHigh, 0x19)
                .wait(1500);
        });
        let timeline = replay(&log);
        assert!(timeline.states[0].pulse1.is_sounding());
        // 4-step half frames land at cycles 14913 and 29829.
        let first_silent = timeline
            .states
            .iter()
            .position(|s| !s.pulse1.is_sounding())
            .unwrap();
        let cycle = cycle_at(first_silent as u64, NTSC_CLOCK);
        assert!((29829..29829 + 41).contains(&cycle), "silent from cycle {cycle}");
    }

    #[test]
    fn five_step_write_clocks_immediately() {
        let log = log_of(|b| {
            b.write(Register::Status, 0x01)
                .write(Register::Pulse1Control, 0x1F)
                .write(Register::Pulse1TimerHigh, 0x19)
                .write(Register::FrameCounter, 0x80)
                .wait(1);
        });
        let timeline = replay(&log);
        assert_eq!(timeline.states[0].pulse1.length_counter, 1);
    }

    #[test]
    fn diff_reproduces_replay() {
        let log = log_of(|b| {
            b.write(Register::Status, 0x0F)
                .write(Register::Pulse1Control, 0xBF)
                .write(Register::Pulse1Sweep, 0x08)
                .write(Register::Pulse1TimerLow, 0xFD)
                .write(Register::Pulse1TimerHigh, 0x08)
                .wait(100)
                .mark_loop()
                .write(Register::Pulse1TimerHigh, 0x08)
                .write(Register::Pulse1TimerHigh, 0x08)
                .wait(50)
                .write(Register::Pulse1Control, 0xBF)
                .write(Register::NoiseControl, 0x30)
                .wait(20);
        });
        let timeline = replay(&log);
        let rebuilt = diff(&timeline);
        assert_eq!(rebuilt.total_ticks(), 170);
        assert_eq!(rebuilt.loop_tick(), Some(100));
        assert_eq!(settled(&replay(&rebuilt)), settled(&timeline));
        // Same-value control writes are coalesced, length reloads are not.
        let writes = rebuilt
            .iter()
            .filter(|c| matches!(c, Command::Write { .. }))
            .count();
        assert_eq!(writes, 7);
    }

    #[test]
    fn dmc_restart_survives_diff() {
        let log = log_of(|b| {
            b.write(Register::DmcControl, 0x4F)
                .write(Register::DmcLength, 0x01)
                .write(Register::Status, 0x10)
                .wait(30)
                .write(Register::Status, 0x00)
                .write(Register::Status, 0x10)
                .wait(30);
        });
        let timeline = replay(&log);
        assert!(timeline.states[30].dmc_restarted());
        assert_eq!(replay(&diff(&timeline)), timeline);
    }
}
