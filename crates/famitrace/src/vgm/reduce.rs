//! Stream reduction: channel suppression and truncation.
//!
//! Both operations are pure filters from one `EventLog` to another.
//! Suppression keeps the total tick count unchanged; truncation cuts the
//! log to a window and keeps the loop point only when it falls inside.
use super::command::Command;
use super::document::{EventLog, EventLogBuilder};
use crate::chip::{Channel, ChannelSet, Envelope, Register, RegisterState, replay};
use crate::error::{Error, Result};

/// Channel suppression settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceOptions {
    /// Channels whose writes are removed. Must not contain Pulse 1.
    pub suppress: ChannelSet,
}

impl ReduceOptions {
    pub fn suppressing(channels: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            suppress: channels.into_iter().collect(),
        }
    }
}

/// Truncation window in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncateOptions {
    /// First tick kept.
    pub start: u64,
    /// Maximum number of ticks kept.
    pub length: u64,
}

/// Drop every write to the suppressed channels.
///
/// Status writes keep their other bits with the suppressed channels'
/// enable bits cleared. RAM blocks go too when DMC is suppressed.
pub fn suppress_channels(log: &EventLog, options: &ReduceOptions) -> Result<EventLog> {
    if let Some(channel) = options.suppress.iter().find(|c| !c.is_suppressible()) {
        return Err(Error::range(
            "suppressed channel",
            format!("{channel} anchors timing and cannot be suppressed"),
        ));
    }
    let mask = options.suppress.status_mask();
    let mut builder = EventLogBuilder::new(log.clock());

    for (index, command) in log.iter().enumerate() {
        if Some(index) == log.loop_index() {
            builder.mark_loop();
        }
        match command {
            Command::Write { register, .. }
                if register
                    .channel()
                    .is_some_and(|c| options.suppress.contains(c)) => {}
            Command::Write {
                register: Register::Status,
                value,
            } => {
                builder.write(Register::Status, value & !mask);
            }
            Command::RamWrite(_) if options.suppress.contains(Channel::Dmc) => {}
            other => {
                builder.push(other.clone());
            }
        }
    }
    if log.loop_index() == Some(log.commands().len()) {
        builder.mark_loop();
    }
    let reduced = builder.finish();
    tracing::trace!(
        suppressed = ?options.suppress,
        before = log.commands().len(),
        after = reduced.commands().len(),
        "suppressed channels"
    );
    Ok(reduced)
}

/// Order of the coalesced prelude: plain registers first, then status, then
/// the writes with side effects so length loads land on enabled channels.
fn prelude_order() -> impl Iterator<Item = Register> {
    let channel_regs = Register::ALL.into_iter().filter(|r| r.is_plain());
    let side_effects = Register::ALL.into_iter().filter(|r| r.has_side_effect());
    std::iter::once(Register::FrameCounter)
        .chain(channel_regs)
        .chain(std::iter::once(Register::Status))
        .chain(side_effects)
}

/// Cut the log to `options.length` ticks starting at `options.start`.
///
/// Writes before the window are coalesced into a prelude holding the last
/// value of every register, so the window opens with the register values
/// in force at its first tick. Channels that had already run out by then
/// stay silent: their length loads land while the status register holds
/// them disabled, and an idle DMC is left disabled. Records past the window are dropped and an
/// end marker is appended. The result spans
/// `min(length, total - start)` ticks.
pub fn truncate(log: &EventLog, options: &TruncateOptions) -> Result<EventLog> {
    let total = log.total_ticks();
    if options.length == 0 {
        return Err(Error::range("truncation length", "must be at least one tick"));
    }
    if options.start > total {
        return Err(Error::range(
            "truncation start",
            format!("tick {} is past the end of a {total}-tick log", options.start),
        ));
    }
    let end = options.start.saturating_add(options.length).min(total);
    let keep_loop = log
        .loop_tick()
        .is_some_and(|tick| tick >= options.start && tick < end);

    let entering = state_entering(log, options.start);
    let mut builder = EventLogBuilder::new(log.clock());
    let mut last = [None::<u8>; 0x18];
    let mut tick = 0u64;
    let mut in_window = false;

    for (index, command) in log.iter().enumerate() {
        if !in_window && tick >= options.start {
            push_prelude(&mut builder, &last, &entering);
            in_window = true;
        }
        if tick >= end {
            break;
        }
        if in_window && keep_loop && Some(index) == log.loop_index() {
            builder.mark_loop();
        }
        match command {
            Command::Write { register, value } if !in_window => {
                last[register.id() as usize] = Some(*value);
            }
            Command::Wait(n) => {
                let from = tick.max(options.start);
                tick += *n as u64;
                let to = tick.min(end);
                if to > from {
                    if !in_window {
                        push_prelude(&mut builder, &last, &entering);
                        in_window = true;
                    }
                    builder.wait((to - from) as u32);
                }
            }
            Command::End => break,
            // RAM blocks are kept wherever they sit: the samples they hold
            // may be triggered inside the window.
            other => {
                builder.push(other.clone());
            }
        }
    }
    if keep_loop && log.loop_index() == Some(log.commands().len()) {
        builder.mark_loop();
    }
    let truncated = builder.finish();
    tracing::trace!(
        start = options.start,
        length = truncated.total_ticks(),
        loop_kept = keep_loop,
        "truncated event log"
    );
    Ok(truncated)
}

/// Chip state at the start of tick `start`, before that tick's writes.
fn state_entering(log: &EventLog, start: u64) -> RegisterState {
    let mut prefix = EventLogBuilder::new(log.clock());
    let mut tick = 0u64;
    for command in log {
        if tick >= start {
            break;
        }
        match command {
            Command::Wait(n) => {
                let step = u64::from(*n).min(start - tick);
                prefix.wait(step as u32);
                tick += step;
            }
            Command::End => break,
            other => {
                prefix.push(other.clone());
            }
        }
    }
    prefix.wait(1);
    replay(&prefix.finish()).states.pop().unwrap_or_default()
}

fn envelope_spent(envelope: &Envelope, constant: bool, looping: bool) -> bool {
    !constant && !looping && envelope.decay == 0
}

/// True when `channel` went quiet in a way only a new length load undoes.
fn has_run_out(state: &RegisterState, channel: Channel) -> bool {
    match channel {
        Channel::Pulse1 | Channel::Pulse2 => state.pulse(channel).is_some_and(|p| {
            p.length_counter == 0
                || envelope_spent(&p.envelope, p.constant_volume(), p.length_halt())
        }),
        Channel::Triangle => {
            state.triangle.length_counter == 0 || state.triangle.linear_counter == 0
        }
        Channel::Noise => {
            let noise = &state.noise;
            noise.length_counter == 0
                || envelope_spent(&noise.envelope, noise.constant_volume(), noise.length_halt())
        }
        Channel::Dmc => !state.dmc.is_sounding(),
    }
}

fn push_prelude(builder: &mut EventLogBuilder, last: &[Option<u8>; 0x18], entering: &RegisterState) {
    let idle_dmc = if has_run_out(entering, Channel::Dmc) {
        Channel::Dmc.status_bit()
    } else {
        0
    };
    let held = Channel::PITCHED
        .into_iter()
        .filter(|&c| has_run_out(entering, c))
        .filter(|&c| Register::length_load(c).is_some_and(|r| last[r.id() as usize].is_some()))
        .fold(0u8, |mask, c| mask | c.status_bit());
    let status = last[Register::Status.id() as usize].map(|s| s & !idle_dmc);

    for register in prelude_order() {
        match (register, last[register.id() as usize], status) {
            (Register::Status, _, Some(status)) => {
                builder.write(Register::Status, status & !held);
            }
            (Register::Status, _, None) | (_, None, _) => {}
            (_, Some(value), _) => {
                builder.write(register, value);
            }
        }
    }
    // Enabling afterwards leaves the held channels' counters at 0.
    if let Some(status) = status.filter(|s| s & held != 0) {
        builder.write(Register::Status, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::NTSC_CLOCK;

    fn sample_log() -> EventLog {
        let mut b = EventLogBuilder::new(NTSC_CLOCK);
        b.write(Register::Status, 0x1F)
            .write(Register::Pulse1Control, 0xBF)
            .write(Register::NoiseControl, 0x3F)
            .wait(100)
            .mark_loop()
            .write(Register::NoiseLength, 0x08)
            .wait(100);
        b.finish()
    }

    #[test]
    fn pulse1_cannot_be_suppressed() {
        let options = ReduceOptions::suppressing([Channel::Pulse1]);
        assert!(matches!(
            suppress_channels(&sample_log(), &options),
            Err(Error::RangeViolation { .. })
        ));
    }

    #[test]
    fn suppression_masks_status_and_keeps_time() {
        let log = sample_log();
        let out = suppress_channels(&log, &ReduceOptions::suppressing([Channel::Noise])).unwrap();
        assert_eq!(out.total_ticks(), log.total_ticks());
        assert_eq!(out.loop_tick(), Some(100));
        assert_eq!(out.commands()[0], Command::write(Register::Status, 0x17));
        assert!(out.iter().all(|c| !matches!(
            c,
            Command::Write { register, .. } if register.channel() == Some(Channel::Noise)
        )));
    }

    #[test]
    fn truncation_rejects_bad_windows() {
        let log = sample_log();
        let empty = TruncateOptions { start: 0, length: 0 };
        assert!(truncate(&log, &empty).is_err());
        let late = TruncateOptions {
            start: 201,
            length: 5,
        };
        assert!(truncate(&log, &late).is_err());
    }

    #[test]
    fn truncation_keeps_prelude_and_inner_loop() {
        let log = sample_log();
        let out = truncate(&log, &TruncateOptions { start: 50, length: 100 }).unwrap();
        assert_eq!(out.total_ticks(), 100);
        assert_eq!(out.loop_tick(), Some(50));
        let writes: Vec<_> = out
            .iter()
            .filter_map(|c| match c {
                Command::Write { register, .. } => Some(*register),
                _ => None,
            })
            .collect();
        assert_eq!(
            writes,
            vec![
                Register::Pulse1Control,
                Register::NoiseControl,
                Register::Status,
                Register::NoiseLength
            ]
        );
    }

    #[test]
    fn expired_note_stays_silent_after_truncation() {
        // Index 3 loads 2 and the note is not halted; it is gone by tick 1000.
        let mut b = EventLogBuilder::new(NTSC_CLOCK);
        b.write(Register::Status, 0x01)
            .write(Register::Pulse1Control, 0x1F)
            .write(Register::Pulse1TimerLow, 0x00)
            .write(Register::Pulse1TimerHigh, 0x19)
            .wait(1500);
        let log = b.finish();
        let full = replay(&log);
        let cut = replay(&truncate(&log, &TruncateOptions { start: 1000, length: 100 }).unwrap());
        assert!(!full.states[1000].pulse1.is_sounding());
        assert!(!cut.states[0].pulse1.is_sounding());
        assert_eq!(cut.states[0].pulse1.regs, full.states[1000].pulse1.regs);
        assert_eq!(cut.states[0].status, full.states[1000].status);
    }

    #[test]
    fn loop_outside_window_is_cleared() {
        let out = truncate(&sample_log(), &TruncateOptions { start: 0, length: 60 }).unwrap();
        assert_eq!(out.total_ticks(), 60);
        assert_eq!(out.loop_tick(), None);
    }
}
