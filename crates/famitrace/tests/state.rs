mod common;

use famitrace::chip::{NTSC_CLOCK, Register, RegisterState, Timeline, diff, replay};
use famitrace::vgm::{Command, EventLog, EventLogBuilder};

use common::five_channel_log;

fn log_of(build: impl FnOnce(&mut EventLogBuilder)) -> EventLog {
    let mut builder = EventLogBuilder::new(NTSC_CLOCK);
    build(&mut builder);
    builder.finish()
}

/// Replay, diff and replay again; both timelines must agree.
fn assert_diff_round_trips(log: &EventLog) -> Timeline {
    let timeline = replay(log);
    let again = replay(&diff(&timeline));
    assert_eq!(settled(&again), settled(&timeline));
    timeline
}

/// States with the per-tick write markers cleared.
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

#[test]
fn replay_yields_one_state_per_tick() {
    let log = five_channel_log();
    let timeline = replay(&log);
    assert_eq!(timeline.len() as u64, log.total_ticks());
    assert_eq!(timeline.clock, log.clock());
    assert_eq!(timeline.samples, log.samples());
}

#[test]
fn status_write_switches_passages() {
    let timeline = replay(&five_channel_log());
    let before = &timeline.states[1999];
    let after = &timeline.states[2000];
    assert!(before.pulse1.is_sounding() && before.pulse2.is_sounding());
    assert!(before.triangle.is_sounding());
    assert!(!before.noise.is_sounding() && !before.dmc.is_sounding());
    assert!(!after.pulse1.is_sounding() && !after.pulse2.is_sounding());
    assert!(!after.triangle.is_sounding());
    assert!(after.noise.is_sounding());
    assert!(after.dmc_restarted());
}

#[test]
fn halted_length_counters_hold() {
    let timeline = replay(&five_channel_log());
    assert!(
        timeline.states[..2000]
            .iter()
            .all(|s| s.pulse1.length_counter == 254 && s.triangle.length_counter == 254)
    );
    assert!(timeline.states[2000..].iter().all(|s| s.noise.is_sounding()));
}

#[test]
fn timer_low_write_slides_without_retrigger() {
    let timeline = replay(&five_channel_log());
    assert_eq!(timeline.states[999].pulse2.period, 0x152);
    let slide = &timeline.states[1000];
    assert_eq!(slide.pulse2.period, 0x140);
    assert!(slide.was_touched(Register::Pulse2TimerLow));
    assert!(!slide.was_touched(Register::Pulse2TimerHigh));
}

#[test]
fn dmc_sample_plays_for_its_length() {
    // 17 bytes at rate index 15: 17 * 8 * 54 cycles, about 181 ticks.
    let timeline = replay(&five_channel_log());
    let state = &timeline.states[2000];
    assert_eq!(state.dmc.sample_address(), 0xC000);
    assert_eq!(state.dmc.sample_length(), 17);
    assert_eq!(state.dmc.output_level, 0x40);
    assert!(timeline.states[2178].dmc.is_sounding());
    assert!(!timeline.states[2184].dmc.is_sounding());
}

#[test]
fn diff_reproduces_the_timeline() {
    let timeline = replay(&five_channel_log());
    let rebuilt = diff(&timeline);
    assert_eq!(rebuilt.total_ticks(), 4000);
    let again = replay(&rebuilt);
    assert_eq!(settled(&again), settled(&timeline));
    assert_eq!(again.samples, timeline.samples);
}

#[test]
fn length_load_before_enable_survives_diff() {
    let log = log_of(|b| {
        b.write(Register::Pulse1Control, 0xBF)
            .write(Register::Pulse1Sweep, 0x08)
            .write(Register::Pulse1TimerLow, 0xFD)
            .write(Register::Pulse1TimerHigh, 0x08)
            .write(Register::Status, 0x01)
            .wait(100);
    });
    let timeline = assert_diff_round_trips(&log);
    assert_eq!(timeline.states[50].pulse1.length_counter, 0);
    assert!(!timeline.states[50].pulse1.is_sounding());
}

#[test]
fn length_load_around_five_step_write_survives_diff() {
    // Index 3 loads 2; the immediate half frame takes one off only when the
    // load came first.
    let before = log_of(|b| {
        b.write(Register::Status, 0x01)
            .write(Register::Pulse1Control, 0x1F)
            .write(Register::Pulse1TimerHigh, 0x19)
            .write(Register::FrameCounter, 0x80)
            .wait(100);
    });
    let after = log_of(|b| {
        b.write(Register::Status, 0x01)
            .write(Register::Pulse1Control, 0x1F)
            .write(Register::FrameCounter, 0x80)
            .write(Register::Pulse1TimerHigh, 0x19)
            .wait(100);
    });
    assert_eq!(assert_diff_round_trips(&before).states[0].pulse1.length_counter, 1);
    assert_eq!(assert_diff_round_trips(&after).states[0].pulse1.length_counter, 2);
}

#[test]
fn disable_and_reenable_within_a_tick_survives_diff() {
    let log = log_of(|b| {
        b.write(Register::Status, 0x01)
            .write(Register::Pulse1Control, 0xBF)
            .write(Register::Pulse1Sweep, 0x08)
            .write(Register::Pulse1TimerHigh, 0x08)
            .wait(10)
            .write(Register::Pulse1TimerHigh, 0x08)
            .write(Register::Status, 0x00)
            .write(Register::Status, 0x01)
            .wait(10);
    });
    let timeline = assert_diff_round_trips(&log);
    assert_eq!(timeline.states[9].pulse1.length_counter, 254);
    assert_eq!(timeline.states[10].pulse1.length_counter, 0);
}

#[test]
fn same_value_sweep_write_survives_diff() {
    // Sweep enabled with divider period 7 and shift 0, so the period holds
    // while the divider runs.
    let log = log_of(|b| {
        b.write(Register::Status, 0x01)
            .write(Register::Pulse1Control, 0xBF)
            .write(Register::Pulse1Sweep, 0xF8)
            .write(Register::Pulse1TimerLow, 0xFD)
            .write(Register::Pulse1TimerHigh, 0x08)
            .wait(500)
            .write(Register::Pulse1Sweep, 0xF8)
            .wait(500);
    });
    let timeline = assert_diff_round_trips(&log);
    assert!(!timeline.states[499].pulse1.sweep_reload);
    assert!(timeline.states[500].pulse1.sweep_reload);
    let rebuilt = diff(&timeline);
    let sweeps = rebuilt
        .iter()
        .filter(|c| {
            matches!(
                c,
                Command::Write {
                    register: Register::Pulse1Sweep,
                    ..
                }
            )
        })
        .count();
    assert_eq!(sweeps, 2);
}
