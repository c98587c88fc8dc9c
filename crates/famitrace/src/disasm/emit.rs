//! Notes back to register state.
//!
//! Every note is written in a canonical register form: constant volume with
//! the length counter halted, a sweep unit that can never mute, and the
//! status register gating the channel on and off. The writes are replayed
//! through the emulator, so the result is a timeline the chip can actually
//! produce.
use super::note::{NoteEvent, NoteStream, Pitch};
use crate::chip::{Channel, Register, Timeline, replay};
use crate::vgm::{EventLog, EventLogBuilder};

/// Sweep disabled, negate set, shift 0: the target period is always below
/// the current one, which keeps the overflow mute off.
const SWEEP_OFF: u8 = 0x08;
/// Length index 1 (254 frames); irrelevant with the halt flag set.
const LENGTH_LOAD: u8 = 0x08;
/// Triangle control flag with the maximum reload value.
const TRIANGLE_HOLD: u8 = 0xFF;
const HALT_CONSTANT: u8 = 0x30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event<'a> {
    Onset {
        note: &'a NoteEvent,
        /// The previous note on this channel ends exactly here.
        follows: Option<&'a NoteEvent>,
    },
    Change {
        velocity: u8,
        timbre: u8,
    },
    Release,
}

fn control_register(channel: Channel) -> Register {
    match channel {
        Channel::Pulse1 => Register::Pulse1Control,
        Channel::Pulse2 => Register::Pulse2Control,
        Channel::Triangle => Register::TriangleLinear,
        Channel::Noise => Register::NoiseControl,
        Channel::Dmc => Register::DmcControl,
    }
}

fn pulse_control(velocity: u8, timbre: u8) -> u8 {
    ((timbre & 0x03) << 6) | HALT_CONSTANT | (velocity & 0x0F)
}

fn noise_period(index: u8, timbre: u8) -> u8 {
    ((timbre & 0x01) << 7) | (index & 0x0F)
}

fn period_of(note: &NoteEvent) -> u16 {
    match note.pitch {
        Pitch::Period(p) => p,
        _ => 0,
    }
}

/// Per-tick writes split into the phases the chip needs: plain registers,
/// then status, then length loads, then the DMC tail.
#[derive(Default)]
struct TickWrites {
    plain: Vec<(Register, u8)>,
    loads: Vec<(Register, u8)>,
    dmc: Vec<(Register, u8)>,
    dmc_restart: bool,
}

impl TickWrites {
    fn onset(&mut self, note: &NoteEvent, follows: Option<&NoteEvent>) {
        let channel = note.channel;
        match channel {
            Channel::Pulse1 | Channel::Pulse2 => {
                let (low, high) = if channel == Channel::Pulse1 {
                    (Register::Pulse1TimerLow, Register::Pulse1TimerHigh)
                } else {
                    (Register::Pulse2TimerLow, Register::Pulse2TimerHigh)
                };
                let sweep = if channel == Channel::Pulse1 {
                    Register::Pulse1Sweep
                } else {
                    Register::Pulse2Sweep
                };
                self.plain.push((control_register(channel), pulse_control(note.velocity, note.timbre)));
                self.timer(note, follows, low, high, Some((sweep, SWEEP_OFF)));
            }
            Channel::Triangle => {
                self.plain.push((Register::TriangleLinear, TRIANGLE_HOLD));
                self.timer(
                    note,
                    follows,
                    Register::TriangleTimerLow,
                    Register::TriangleTimerHigh,
                    None,
                );
            }
            Channel::Noise => {
                let index = match note.pitch {
                    Pitch::Noise(n) => n,
                    _ => 0,
                };
                self.plain.push((Register::NoiseControl, HALT_CONSTANT | note.velocity));
                let pitch_changed = follows.is_some_and(|prev| prev.pitch != note.pitch);
                self.plain.push((Register::NoisePeriod, noise_period(index, note.timbre)));
                if !pitch_changed {
                    self.loads.push((Register::NoiseLength, LENGTH_LOAD));
                }
            }
            Channel::Dmc => {
                if let Pitch::Sample { address, length } = note.pitch {
                    self.plain.push((Register::DmcControl, note.timbre & 0x4F));
                    self.plain
                        .push((Register::DmcAddress, (address.wrapping_sub(0xC000) / 64) as u8));
                    self.plain
                        .push((Register::DmcLength, (length.saturating_sub(1) / 16) as u8));
                    self.dmc.push((Register::DmcDirectLoad, note.velocity & 0x7F));
                    self.dmc_restart = true;
                }
            }
        }
    }

    /// Timer writes for a tonal note. A note directly following another
    /// one of different pitch only rewrites the bytes that changed, the way
    /// a vibrato or slide leaves the length counter alone; an unchanged
    /// pitch is a retrigger and always reloads.
    fn timer(
        &mut self,
        note: &NoteEvent,
        follows: Option<&NoteEvent>,
        low: Register,
        high: Register,
        sweep: Option<(Register, u8)>,
    ) {
        let period = period_of(note);
        let (low_byte, high_byte) = ((period & 0xFF) as u8, ((period >> 8) & 0x07) as u8 | LENGTH_LOAD);
        match follows {
            Some(prev) if prev.pitch != note.pitch => {
                let old = period_of(prev);
                if old & 0xFF != period & 0xFF {
                    self.plain.push((low, low_byte));
                }
                if old >> 8 != period >> 8 {
                    self.loads.push((high, high_byte));
                }
            }
            _ => {
                if let Some(sweep) = sweep {
                    self.plain.push(sweep);
                }
                self.plain.push((low, low_byte));
                self.loads.push((high, high_byte));
            }
        }
    }

    fn change(&mut self, channel: Channel, note: &NoteEvent, velocity: u8, timbre: u8) {
        match channel {
            Channel::Pulse1 | Channel::Pulse2 => {
                self.plain.push((control_register(channel), pulse_control(velocity, timbre)));
            }
            Channel::Triangle => {}
            Channel::Noise => {
                let index = match note.pitch {
                    Pitch::Noise(n) => n,
                    _ => 0,
                };
                self.plain.push((Register::NoiseControl, HALT_CONSTANT | velocity));
                self.plain.push((Register::NoisePeriod, noise_period(index, timbre)));
            }
            Channel::Dmc => {
                self.plain.push((Register::DmcControl, timbre & 0x4F));
                self.dmc.push((Register::DmcDirectLoad, velocity & 0x7F));
            }
        }
    }
}

/// Canonical event log playing `stream`.
pub fn emit_log(stream: &NoteStream) -> EventLog {
    let mut builder = EventLogBuilder::new(stream.clock);
    for block in stream.samples.blocks() {
        builder.ram(block.clone());
    }

    // (tick, channel, event), processed in tick order.
    let mut events: Vec<(u64, Channel, Event<'_>)> = Vec::new();
    for channel in Channel::ALL {
        let mut previous: Option<&NoteEvent> = None;
        for note in stream.channel(channel) {
            if let Some(prev) = previous
                && prev.end() < note.onset
            {
                events.push((prev.end(), channel, Event::Release));
            }
            let follows = previous.filter(|prev| prev.end() == note.onset);
            events.push((note.onset, channel, Event::Onset { note, follows }));
            for change in &note.changes {
                events.push((
                    change.tick,
                    channel,
                    Event::Change {
                        velocity: change.velocity,
                        timbre: change.timbre,
                    },
                ));
            }
            previous = Some(note);
        }
        if let Some(prev) = previous
            && prev.end() < stream.length
        {
            events.push((prev.end(), channel, Event::Release));
        }
    }
    events.sort_by_key(|(tick, channel, _)| (*tick, channel.index()));

    let mut status = 0u8;
    let mut now = 0u64;
    let mut active: [Option<&NoteEvent>; 5] = [None; 5];
    let mut index = 0;
    while index < events.len() {
        let tick = events[index].0;
        let mut writes = TickWrites::default();
        let mut next_status = status;
        while index < events.len() && events[index].0 == tick {
            let (_, channel, event) = events[index];
            match event {
                Event::Onset { note, follows } => {
                    writes.onset(note, follows);
                    active[channel.index()] = Some(note);
                    next_status |= channel.status_bit();
                }
                Event::Change { velocity, timbre } => {
                    if let Some(note) = active[channel.index()] {
                        writes.change(channel, note, velocity, timbre);
                    }
                }
                Event::Release => {
                    active[channel.index()] = None;
                    next_status &= !channel.status_bit();
                }
            }
            index += 1;
        }

        builder.wait_long(tick - now);
        now = tick;
        for &(register, value) in &writes.plain {
            builder.write(register, value);
        }
        let dmc_bit = Channel::Dmc.status_bit();
        if writes.dmc_restart {
            builder.write(Register::Status, next_status & !dmc_bit);
        } else if next_status != status {
            builder.write(Register::Status, next_status);
        }
        for &(register, value) in writes.loads.iter().chain(&writes.dmc) {
            builder.write(register, value);
        }
        if writes.dmc_restart {
            builder.write(Register::Status, next_status);
        }
        status = next_status;
    }
    builder.wait_long(stream.length.saturating_sub(now));
    builder.finish()
}

/// Rebuild a timeline from notes.
pub fn emit(stream: &NoteStream) -> Timeline {
    let timeline = replay(&emit_log(stream));
    tracing::trace!(notes = stream.notes.len(), ticks = timeline.len(), "emitted notes");
    timeline
}
