//! Text transcription of a note stream.
//!
//! ```text
//! notes clock=1789773 length=2000
//! ram c000 55aa55aa
//! note p1 0 1000 253 15 2
//! chg p1 500 8 2
//! note dmc 100 400 c000:17 8 15
//! ```
//!
//! `note <ch> <onset> <duration> <pitch> <velocity> <timbre>` where pitch is
//! a timer period (pulse, triangle), a period index (noise) or
//! `<address hex>:<length>` (DMC). `chg <ch> <tick> <velocity> <timbre>`
//! attaches to the latest note of that channel.
use std::fmt::Write as _;

use super::note::{NoteEvent, NoteStream, ParamChange, Pitch};
use crate::chip::{Channel, RamBlock, SampleMemory};
use crate::chip::pitch::MAX_PERIOD;
use crate::error::{Error, Result};
use crate::textfmt::{self, Line, hex_bytes, parse_hex_bytes};

pub fn to_text(stream: &NoteStream) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "notes clock={} length={}", stream.clock, stream.length);
    for block in stream.samples.blocks() {
        let _ = writeln!(out, "ram {:04x} {}", block.address, hex_bytes(&block.data));
    }
    for note in &stream.notes {
        let _ = writeln!(
            out,
            "note {} {} {} {} {} {}",
            note.channel, note.onset, note.duration, note.pitch, note.velocity, note.timbre
        );
        for change in &note.changes {
            let _ = writeln!(
                out,
                "chg {} {} {} {}",
                note.channel, change.tick, change.velocity, change.timbre
            );
        }
    }
    out
}

fn parse_channel(line: &Line<'_>, index: usize) -> Result<Channel> {
    let field = line.field(index)?;
    field
        .text
        .parse()
        .map_err(|reason: String| line.error_at(field, reason))
}

fn parse_pitch(line: &Line<'_>, index: usize, channel: Channel) -> Result<Pitch> {
    let field = line.field(index)?;
    let pitch = match channel {
        Channel::Pulse1 | Channel::Pulse2 | Channel::Triangle => {
            let period: u16 = line.parse(index, "period")?;
            (period <= MAX_PERIOD).then_some(Pitch::Period(period))
        }
        Channel::Noise => {
            let n: u8 = line.parse(index, "noise period")?;
            (n < 16).then_some(Pitch::Noise(n))
        }
        Channel::Dmc => field.text.split_once(':').and_then(|(addr, len)| {
            Some(Pitch::Sample {
                address: u16::from_str_radix(addr, 16).ok()?,
                length: len.parse().ok()?,
            })
        }),
    };
    pitch.ok_or_else(|| line.error_at(field, format!("invalid {channel} pitch {:?}", field.text)))
}

fn parse_params(line: &Line<'_>, first: usize, channel: Channel) -> Result<(u8, u8)> {
    let velocity: u8 = line.parse(first, "velocity")?;
    let loudest = if channel == Channel::Dmc { 0x7F } else { 15 };
    if velocity > loudest {
        return Err(line.error_at(line.field(first)?, format!("velocity above {loudest}")));
    }
    let timbre: u8 = line.parse(first + 1, "timbre")?;
    let limit = match channel {
        Channel::Pulse1 | Channel::Pulse2 => 3,
        Channel::Triangle => 0,
        Channel::Noise => 1,
        Channel::Dmc => 0x4F,
    };
    if timbre > limit {
        return Err(line.error_at(line.field(first + 1)?, format!("timbre above {limit}")));
    }
    Ok((velocity, timbre))
}

pub fn from_text(text: &str) -> Result<NoteStream> {
    let mut lines = textfmt::lines(text);
    let header = lines
        .next()
        .ok_or_else(|| Error::syntax(1, 1, "empty transcription"))?;
    if header.keyword() != "notes" {
        return Err(header.error_at(header.field(0)?, "expected \"notes\" header"));
    }
    header.expect_len(3)?;
    let clock = header.parse_clock(1)?;
    let length = header.parse_length(2)?;

    let mut samples = SampleMemory::new();
    let mut notes: Vec<NoteEvent> = Vec::new();
    // Index into `notes` of the latest note per channel.
    let mut latest: [Option<usize>; 5] = [None; 5];

    for line in lines {
        match line.keyword() {
            "ram" => {
                line.expect_len(3)?;
                samples.push(RamBlock {
                    address: line.parse_hex_as(1, "address")?,
                    data: parse_hex_bytes(&line, 2)?,
                });
            }
            "note" => {
                line.expect_len(7)?;
                let channel = parse_channel(&line, 1)?;
                let onset: u64 = line.parse(2, "onset")?;
                let duration: u64 = line.parse(3, "duration")?;
                if duration == 0 || onset.checked_add(duration).is_none_or(|end| end > length) {
                    return Err(line.error_at(line.field(3)?, "note outside the track"));
                }
                if let Some(prev) = latest[channel.index()]
                    && notes[prev].end() > onset
                {
                    return Err(line.error_at(line.field(2)?, "note overlaps the previous one"));
                }
                let pitch = parse_pitch(&line, 4, channel)?;
                let (velocity, timbre) = parse_params(&line, 5, channel)?;
                latest[channel.index()] = Some(notes.len());
                notes.push(NoteEvent {
                    channel,
                    onset,
                    duration,
                    pitch,
                    velocity,
                    timbre,
                    changes: Vec::new(),
                });
            }
            "chg" => {
                line.expect_len(5)?;
                let channel = parse_channel(&line, 1)?;
                let tick_field = line.field(2)?;
                let tick: u64 = line.parse(2, "tick")?;
                let (velocity, timbre) = parse_params(&line, 3, channel)?;
                let note = latest[channel.index()]
                    .map(|i| &mut notes[i])
                    .filter(|n| n.contains(tick) && tick > n.onset)
                    .ok_or_else(|| line.error_at(tick_field, "change outside any note"))?;
                if note.changes.last().is_some_and(|c| c.tick >= tick) {
                    return Err(line.error_at(tick_field, "changes out of order"));
                }
                note.changes.push(ParamChange {
                    tick,
                    velocity,
                    timbre,
                });
            }
            other => {
                return Err(line.error_at(line.field(0)?, format!("unknown record {other:?}")));
            }
        }
    }

    let mut stream = NoteStream {
        clock,
        length,
        notes,
        samples,
    };
    stream.sort();
    Ok(stream)
}
