//! Register state to notes.
use super::note::{NoteEvent, NoteStream, ParamChange, Pitch};
use crate::chip::{Channel, Register, RegisterState, Timeline};

/// What one channel plays during one tick; `None` is silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub pitch: Pitch,
    pub velocity: u8,
    pub timbre: u8,
}

/// Audible voice of `channel` under the silence policy.
pub fn voice(state: &RegisterState, channel: Channel) -> Option<Voice> {
    match channel {
        Channel::Pulse1 | Channel::Pulse2 => {
            let pulse = state.pulse(channel)?;
            let velocity = pulse.output_volume();
            (velocity > 0).then(|| Voice {
                pitch: Pitch::Period(pulse.period),
                velocity,
                timbre: pulse.duty(),
            })
        }
        Channel::Triangle => state.triangle.is_sounding().then(|| Voice {
            pitch: Pitch::Period(state.triangle.period),
            velocity: 15,
            timbre: 0,
        }),
        Channel::Noise => {
            let velocity = state.noise.output_volume();
            (velocity > 0).then(|| Voice {
                pitch: Pitch::Noise(state.noise.period_index()),
                velocity,
                timbre: u8::from(state.noise.mode()),
            })
        }
        Channel::Dmc => state.dmc.is_sounding().then(|| Voice {
            pitch: Pitch::Sample {
                address: state.dmc.sample_address(),
                length: state.dmc.sample_length(),
            },
            velocity: state.dmc.output_level,
            timbre: state.dmc.regs[0] & 0x4F,
        }),
    }
}

/// Whether `state` starts a new note on top of the note playing `current`.
fn is_onset(state: &RegisterState, channel: Channel, current: &NoteEvent, voice: &Voice) -> bool {
    match channel {
        // DMC notes only start on a sample (re)start; register changes
        // mid-sample do not alter what is playing.
        Channel::Dmc => state.dmc_restarted(),
        _ => {
            voice.pitch != current.pitch
                || Register::length_load(channel).is_some_and(|r| state.was_touched(r))
        }
    }
}

fn segment_channel(timeline: &Timeline, channel: Channel, notes: &mut Vec<NoteEvent>) {
    let mut current: Option<NoteEvent> = None;
    let mut params = (0u8, 0u8);

    for (tick, state) in timeline.iter() {
        let Some(v) = voice(state, channel) else {
            if let Some(mut note) = current.take() {
                note.duration = tick - note.onset;
                notes.push(note);
            }
            continue;
        };
        let onset = match &current {
            None => true,
            Some(note) => is_onset(state, channel, note, &v),
        };
        if onset {
            if let Some(mut note) = current.take() {
                note.duration = tick - note.onset;
                notes.push(note);
            }
            current = Some(NoteEvent {
                channel,
                onset: tick,
                duration: 0,
                pitch: v.pitch,
                velocity: v.velocity,
                timbre: v.timbre,
                changes: Vec::new(),
            });
            params = (v.velocity, v.timbre);
        } else if (v.velocity, v.timbre) != params {
            params = (v.velocity, v.timbre);
            if let Some(note) = current.as_mut() {
                note.changes.push(ParamChange {
                    tick,
                    velocity: v.velocity,
                    timbre: v.timbre,
                });
            }
        }
    }
    if let Some(mut note) = current {
        note.duration = timeline.len() as u64 - note.onset;
        notes.push(note);
    }
}

/// Segment a timeline into notes, each channel independently.
///
/// A note starts when the channel goes from silent to sounding, when the
/// pitch changes, when a length-load write retriggers a sounding channel,
/// or when a DMC sample restarts. It lasts until the next onset, silence
/// or the end of the track. Velocity and timbre changes inside a note are
/// kept as `ParamChange`s.
pub fn segment(timeline: &Timeline) -> NoteStream {
    let mut notes = Vec::new();
    for channel in Channel::ALL {
        segment_channel(timeline, channel, &mut notes);
    }
    let mut stream = NoteStream {
        clock: timeline.clock,
        length: timeline.len() as u64,
        notes,
        samples: timeline.samples.clone(),
    };
    stream.sort();
    tracing::trace!(notes = stream.notes.len(), ticks = stream.length, "segmented timeline");
    stream
}
