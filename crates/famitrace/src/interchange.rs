//! Note-interchange bridge.
//!
//! Maps a score onto a generic multi-track note-event layout (one track per
//! channel, MIDI-like events timestamped in frames) and back. The mapping
//! is structural only:
//!
//! - key: the rounded pitch; the remainder is a 14-bit pitch bend with a
//!   range of ±2 semitones
//! - expression: velocity × 8, so integer and eighth-step velocities
//!   survive
//! - program: timbre
//! - DMC: each distinct trigger becomes an entry of a trigger table and
//!   the note key indexes that table
use crate::chip::{Channel, SampleMemory};
use crate::error::{Error, Result};
use crate::score::{Fidelity, Frame, FrameRate, PitchedVoice, SampleTrigger, Score};

/// Centre of the 14-bit pitch-bend range.
pub const BEND_CENTRE: u16 = 8192;
/// Semitones covered by a full bend in either direction.
pub const BEND_RANGE: f64 = 2.0;
/// Expression steps per velocity unit.
const EXPRESSION_SCALE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
    /// Channel volume, 0-127.
    Expression(u8),
    Program(u8),
    /// 0-16383, centre `BEND_CENTRE`.
    PitchBend(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEvent {
    pub frame: usize,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub channel: Channel,
    pub events: Vec<TrackEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interchange {
    pub frame_rate: FrameRate,
    pub clock: u32,
    pub length_ticks: u64,
    pub tracks: Vec<Track>,
    /// DMC triggers addressed by the keys of the DMC track.
    pub triggers: Vec<SampleTrigger>,
    pub samples: SampleMemory,
}

fn bend_of(offset: f64) -> u16 {
    let bend = BEND_CENTRE as f64 + (offset / BEND_RANGE * BEND_CENTRE as f64).round();
    bend.clamp(0.0, 16383.0) as u16
}

fn offset_of(bend: u16) -> f64 {
    (bend as f64 - BEND_CENTRE as f64) / BEND_CENTRE as f64 * BEND_RANGE
}

/// Controller state of one track while walking frames.
#[derive(Debug, Clone, Copy)]
struct Controllers {
    key: Option<u8>,
    bend: u16,
    expression: u8,
    program: u8,
}

impl Default for Controllers {
    fn default() -> Self {
        Self {
            key: None,
            bend: BEND_CENTRE,
            expression: 0,
            program: 0,
        }
    }
}

fn pitched_track(score: &Score, channel: Channel) -> Track {
    let mut events = Vec::new();
    let mut state = Controllers::default();
    for (frame, voice) in score.frames.iter().map(|f| f.voice(channel)).enumerate() {
        let mut push = |event| events.push(TrackEvent { frame, event });
        let Some(voice) = voice else {
            if let Some(key) = state.key.take() {
                push(Event::NoteOff { key });
            }
            continue;
        };
        let (key, bend) = match channel {
            Channel::Noise => (voice.pitch.round().clamp(0.0, 15.0) as u8, BEND_CENTRE),
            _ => {
                let key = voice.pitch.round().clamp(0.0, 127.0);
                (key as u8, bend_of(voice.pitch - key))
            }
        };
        let expression = (voice.velocity * EXPRESSION_SCALE).round().clamp(0.0, 127.0) as u8;
        let starts = voice.onset || state.key != Some(key);
        if starts && let Some(old) = state.key.take() {
            push(Event::NoteOff { key: old });
        }
        if bend != state.bend {
            push(Event::PitchBend(bend));
        }
        if expression != state.expression {
            push(Event::Expression(expression));
        }
        if voice.timbre != state.program {
            push(Event::Program(voice.timbre));
        }
        if starts {
            push(Event::NoteOn {
                key,
                velocity: expression.max(1),
            });
        }
        state = Controllers {
            key: Some(key),
            bend,
            expression,
            program: voice.timbre,
        };
    }
    if let Some(key) = state.key {
        events.push(TrackEvent {
            frame: score.frames.len(),
            event: Event::NoteOff { key },
        });
    }
    Track { channel, events }
}

impl Interchange {
    /// Lay a score out as tracks. Fails when the score uses more distinct
    /// DMC triggers than a key can address.
    pub fn from_score(score: &Score) -> Result<Self> {
        let mut tracks: Vec<Track> = Channel::PITCHED
            .into_iter()
            .map(|channel| pitched_track(score, channel))
            .collect();

        let mut triggers: Vec<SampleTrigger> = Vec::new();
        let mut dmc = Vec::new();
        for (frame, trigger) in score
            .frames
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.dmc.map(|t| (i, t)))
        {
            let key = match triggers.iter().position(|t| *t == trigger) {
                Some(index) => index,
                None => {
                    triggers.push(trigger);
                    triggers.len() - 1
                }
            };
            let key = u8::try_from(key)
                .ok()
                .filter(|k| *k < 128)
                .ok_or_else(|| Error::range("DMC trigger table", "more than 128 distinct triggers"))?;
            dmc.push(TrackEvent {
                frame,
                event: Event::NoteOn {
                    key,
                    velocity: 127,
                },
            });
            dmc.push(TrackEvent {
                frame: frame + 1,
                event: Event::NoteOff { key },
            });
        }
        tracks.push(Track {
            channel: Channel::Dmc,
            events: dmc,
        });

        Ok(Self {
            frame_rate: score.rate,
            clock: score.clock,
            length_ticks: score.length_ticks,
            tracks,
            triggers,
            samples: score.samples.clone(),
        })
    }

    /// Rebuild an expressive score. Fails on DMC keys outside the trigger
    /// table.
    pub fn into_score(&self) -> Result<Score> {
        let mut frames = vec![Frame::default(); self.frame_rate.frame_count(self.length_ticks)];
        for track in &self.tracks {
            if track.channel == Channel::Dmc {
                for event in &track.events {
                    if let Event::NoteOn { key, .. } = event.event {
                        let trigger = self.triggers.get(key as usize).copied().ok_or_else(|| {
                            Error::range("DMC key", format!("{key} has no trigger"))
                        })?;
                        if let Some(frame) = frames.get_mut(event.frame) {
                            frame.dmc = Some(trigger);
                        }
                    }
                }
                continue;
            }

            let slot = track.channel.index();
            let mut state = Controllers::default();
            let mut events = track.events.iter().peekable();
            for (index, frame) in frames.iter_mut().enumerate() {
                let mut onset = false;
                while let Some(event) = events.next_if(|e| e.frame <= index) {
                    match event.event {
                        Event::NoteOn { key, .. } => {
                            state.key = Some(key);
                            onset = true;
                        }
                        Event::NoteOff { key } if state.key == Some(key) => {
                            state.key = None;
                            onset = false;
                        }
                        Event::NoteOff { .. } => {}
                        Event::Expression(value) => state.expression = value,
                        Event::Program(value) => state.program = value,
                        Event::PitchBend(value) => state.bend = value,
                    }
                }
                frame.voices[slot] = state.key.map(|key| PitchedVoice {
                    pitch: key as f64 + offset_of(state.bend),
                    velocity: state.expression as f64 / EXPRESSION_SCALE,
                    timbre: state.program,
                    onset,
                });
            }
        }

        Ok(Score {
            rate: self.frame_rate,
            fidelity: Fidelity::Expressive,
            clock: self.clock,
            length_ticks: self.length_ticks,
            frames,
            samples: self.samples.clone(),
        })
    }
}
