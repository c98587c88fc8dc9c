//! Notes to frames and back.
use super::{FrameRate, Fidelity, Frame, PitchedVoice, SampleTrigger, Score};
use crate::chip::pitch::{period_to_semitone, semitone_to_period};
use crate::chip::tables::DMC_RATE_TABLE;
use crate::chip::{Channel, TICK_RATE};
use crate::disasm::{NoteEvent, NoteStream, ParamChange, Pitch};
use crate::error::Result;

fn pitch_value(note: &NoteEvent, clock: u32) -> f64 {
    match note.pitch {
        Pitch::Period(period) => period_to_semitone(note.channel, period, clock),
        Pitch::Noise(index) => index as f64,
        Pitch::Sample { .. } => 0.0,
    }
}

/// The note shown in a frame: the one sounding at the frame centre, else
/// the latest onset overlapping the frame.
fn frame_note<'a>(notes: &[&'a NoteEvent], start: u64, end: u64, centre: u64) -> Option<&'a NoteEvent> {
    let overlapping = notes
        .iter()
        .copied()
        .filter(|n| n.onset < end && n.end() > start);
    let mut latest: Option<&NoteEvent> = None;
    for note in overlapping {
        if note.contains(centre) {
            return Some(note);
        }
        if latest.is_none_or(|l| note.onset > l.onset) {
            latest = Some(note);
        }
    }
    latest
}

/// Place a note stream on a frame grid of `fps` frames per second.
///
/// The first frame showing a note is flagged as its onset and carries the
/// onset velocity and timbre; later frames sample them at the frame
/// centre. Notes shorter than a frame may be hidden by a neighbour.
pub fn quantize(stream: &NoteStream, fps: f64) -> Result<Score> {
    let rate = FrameRate::new(fps)?;
    let count = rate.frame_count(stream.length);
    let mut frames = vec![Frame::default(); count];

    for channel in Channel::PITCHED {
        let notes: Vec<&NoteEvent> = stream.channel(channel).collect();
        let mut first = 0;
        // Onset tick of the note shown in the previous frame; onsets are
        // unique within a channel.
        let mut shown: Option<u64> = None;
        for (index, frame) in frames.iter_mut().enumerate() {
            let start = rate.frame_start(index);
            let end = rate.frame_start(index + 1).max(start + 1);
            while first < notes.len() && notes[first].end() <= start {
                first += 1;
            }
            let centre = rate.frame_centre(index).min(stream.length.saturating_sub(1));
            let Some(note) = frame_note(&notes[first..], start, end, centre) else {
                shown = None;
                continue;
            };
            let onset = shown != Some(note.onset);
            shown = Some(note.onset);
            let (velocity, timbre) = if onset {
                (note.velocity, note.timbre)
            } else {
                note.params_at(centre.max(note.onset).min(note.end() - 1))
            };
            frame.voices[channel.index()] = Some(PitchedVoice {
                pitch: pitch_value(note, stream.clock),
                velocity: velocity as f64,
                timbre,
                onset,
            });
        }
    }

    for note in stream.channel(Channel::Dmc) {
        let Pitch::Sample { address, length } = note.pitch else {
            continue;
        };
        let index = ((note.onset as f64 / rate.ticks_per_frame()) + 1e-9).floor() as usize;
        if let Some(frame) = frames.get_mut(index) {
            frame.dmc = Some(SampleTrigger {
                address,
                length,
                control: note.timbre,
                level: note.velocity >> 3,
            });
        }
    }

    tracing::trace!(frames = count, fps, "quantized notes");
    Ok(Score {
        rate,
        fidelity: Fidelity::Expressive,
        clock: stream.clock,
        length_ticks: stream.length,
        frames,
        samples: stream.samples.clone(),
    })
}

/// Ticks a DMC sample plays for when started once.
fn sample_ticks(trigger: &SampleTrigger, clock: u32) -> u64 {
    let per_byte = DMC_RATE_TABLE[(trigger.control & 0x0F) as usize] as u64 * 8;
    let cycles = trigger.length as u64 * per_byte;
    match u64::from(clock) {
        // Without a clock the sample never ends on its own.
        0 => u64::MAX,
        clock => (cycles * TICK_RATE as u64).div_ceil(clock),
    }
}

fn level_of(velocity: f64) -> u8 {
    velocity.round().clamp(0.0, 15.0) as u8
}

fn pitch_of(channel: Channel, voice: &PitchedVoice, clock: u32) -> Pitch {
    match channel {
        Channel::Noise => Pitch::Noise(voice.pitch.round().clamp(0.0, 15.0) as u8),
        _ => Pitch::Period(semitone_to_period(channel, voice.pitch, clock)),
    }
}

/// Rebuild notes from a score.
///
/// A note starts on an onset frame, after silence, or where the pitch
/// moves; it ends where the channel falls silent or the next note starts.
/// Frames with zero velocity count as silence. For expressive scores this
/// recovers onsets to within one frame and pitch and velocity exactly.
pub fn to_note_events(score: &Score) -> NoteStream {
    let rate = score.rate;
    let length = score.length_ticks;
    let mut notes = Vec::new();

    for channel in Channel::PITCHED {
        let mut current: Option<NoteEvent> = None;
        let mut params = (0u8, 0u8);
        for (index, frame) in score.frames.iter().enumerate() {
            let tick = rate.frame_start(index).min(length);
            let voice = frame
                .voice(channel)
                .filter(|v| level_of(v.velocity) > 0);
            let Some(voice) = voice else {
                if let Some(mut note) = current.take() {
                    note.duration = tick - note.onset;
                    notes.push(note);
                }
                continue;
            };
            let pitch = pitch_of(channel, voice, score.clock);
            let (velocity, timbre) = (level_of(voice.velocity), voice.timbre);
            let starts = voice.onset || current.as_ref().is_none_or(|n| n.pitch != pitch);
            if starts {
                if let Some(mut note) = current.take() {
                    note.duration = tick - note.onset;
                    notes.push(note);
                }
                current = Some(NoteEvent {
                    channel,
                    onset: tick,
                    duration: 0,
                    pitch,
                    velocity,
                    timbre,
                    changes: Vec::new(),
                });
                params = (velocity, timbre);
            } else if (velocity, timbre) != params {
                params = (velocity, timbre);
                if let Some(note) = current.as_mut() {
                    note.changes.push(ParamChange {
                        tick,
                        velocity,
                        timbre,
                    });
                }
            }
        }
        if let Some(mut note) = current {
            note.duration = length - note.onset;
            notes.push(note);
        }
    }

    let triggers: Vec<(u64, SampleTrigger)> = score
        .frames
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.dmc.map(|t| (rate.frame_start(i).min(length), t)))
        .collect();
    for (i, (onset, trigger)) in triggers.iter().enumerate() {
        let limit = triggers.get(i + 1).map_or(length, |(next, _)| *next);
        let looping = trigger.control & 0x40 != 0;
        let end = if looping {
            limit
        } else {
            onset.saturating_add(sample_ticks(trigger, score.clock)).min(limit)
        };
        if end > *onset {
            notes.push(NoteEvent {
                channel: Channel::Dmc,
                onset: *onset,
                duration: end - onset,
                pitch: Pitch::Sample {
                    address: trigger.address,
                    length: trigger.length,
                },
                velocity: trigger.level << 3,
                timbre: trigger.control,
                changes: Vec::new(),
            });
        }
    }

    // Zero-length notes appear when frames collapse onto the track end.
    notes.retain(|n| n.duration > 0);
    let mut stream = NoteStream {
        clock: score.clock,
        length,
        notes,
        samples: score.samples.clone(),
    };
    stream.sort();
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::NTSC_CLOCK;

    fn note(channel: Channel, onset: u64, duration: u64, pitch: Pitch) -> NoteEvent {
        NoteEvent {
            channel,
            onset,
            duration,
            pitch,
            velocity: 12,
            timbre: 1,
            changes: Vec::new(),
        }
    }

    fn stream(notes: Vec<NoteEvent>, length: u64) -> NoteStream {
        let mut s = NoteStream {
            clock: NTSC_CLOCK,
            length,
            notes,
            ..NoteStream::default()
        };
        s.sort();
        s
    }

    #[test]
    fn onset_is_flagged_once() {
        let s = stream(vec![note(Channel::Pulse1, 100, 3000, Pitch::Period(253))], 4410);
        let score = quantize(&s, 60.0).unwrap();
        assert_eq!(score.frames.len(), 6);
        let flags: Vec<_> = score
            .frames
            .iter()
            .map(|f| f.voice(Channel::Pulse1).map(|v| v.onset))
            .collect();
        assert_eq!(
            flags,
            vec![Some(true), Some(false), Some(false), Some(false), Some(false), None]
        );
    }

    #[test]
    fn short_note_in_frame_is_kept_when_nothing_covers_the_centre() {
        let s = stream(vec![note(Channel::Noise, 10, 50, Pitch::Noise(4))], 1470);
        let score = quantize(&s, 60.0).unwrap();
        let v = score.frames[0].voice(Channel::Noise).unwrap();
        assert_eq!(v.pitch, 4.0);
        assert!(v.onset);
        assert!(score.frames[1].voice(Channel::Noise).is_none());
    }

    #[test]
    fn dmc_duration_follows_sample_length() {
        let trigger = Pitch::Sample {
            address: 0xC000,
            length: 17,
        };
        let mut n = note(Channel::Dmc, 0, 100, trigger);
        n.timbre = 0x0F;
        let s = stream(vec![n], 44_100);
        let back = to_note_events(&quantize(&s, 100.0).unwrap());
        let dmc = back.channel(Channel::Dmc).next().unwrap();
        // 17 bytes * 8 bits * 54 cycles at the NTSC clock.
        assert_eq!(dmc.duration, (17 * 8 * 54 * 44_100u64).div_ceil(NTSC_CLOCK as u64));
    }
}
