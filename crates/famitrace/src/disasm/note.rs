//! Note-level representation of a track.
use std::fmt;

use crate::chip::{Channel, NTSC_CLOCK, SampleMemory};

/// What a note plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pitch {
    /// Timer period of a pulse or triangle note.
    Period(u16),
    /// Noise period index (0-15).
    Noise(u8),
    /// DMC sample start address and length in bytes.
    Sample { address: u16, length: u16 },
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pitch::Period(p) => write!(f, "{p}"),
            Pitch::Noise(n) => write!(f, "{n}"),
            Pitch::Sample { address, length } => write!(f, "{address:04x}:{length}"),
        }
    }
}

/// Mid-note change of velocity or timbre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamChange {
    pub tick: u64,
    pub velocity: u8,
    pub timbre: u8,
}

/// One segmented note.
///
/// `timbre` is the duty cycle for pulse notes, 0 for triangle notes, the
/// mode bit for noise notes and the control byte (loop flag and rate
/// index) for DMC notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEvent {
    pub channel: Channel,
    pub onset: u64,
    pub duration: u64,
    pub pitch: Pitch,
    /// Output volume 0-15 at onset; the 7-bit direct-load level for DMC.
    pub velocity: u8,
    pub timbre: u8,
    /// Changes after the onset, in tick order, all inside the note.
    pub changes: Vec<ParamChange>,
}

impl NoteEvent {
    /// First tick after the note.
    pub fn end(&self) -> u64 {
        self.onset + self.duration
    }

    pub fn contains(&self, tick: u64) -> bool {
        tick >= self.onset && tick < self.end()
    }

    /// Velocity and timbre in force at `tick`.
    pub fn params_at(&self, tick: u64) -> (u8, u8) {
        self.changes
            .iter()
            .take_while(|c| c.tick <= tick)
            .last()
            .map(|c| (c.velocity, c.timbre))
            .unwrap_or((self.velocity, self.timbre))
    }
}

/// All notes of a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteStream {
    pub clock: u32,
    /// Track length in ticks.
    pub length: u64,
    /// Ordered by onset, then channel.
    pub notes: Vec<NoteEvent>,
    pub samples: SampleMemory,
}

impl Default for NoteStream {
    fn default() -> Self {
        Self {
            clock: NTSC_CLOCK,
            length: 0,
            notes: Vec::new(),
            samples: SampleMemory::new(),
        }
    }
}

impl NoteStream {
    /// Notes of one channel in onset order.
    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = &NoteEvent> {
        self.notes.iter().filter(move |n| n.channel == channel)
    }

    pub(crate) fn sort(&mut self) {
        self.notes
            .sort_by_key(|n| (n.onset, n.channel.index()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_changes() {
        let note = NoteEvent {
            channel: Channel::Pulse1,
            onset: 10,
            duration: 20,
            pitch: Pitch::Period(300),
            velocity: 15,
            timbre: 2,
            changes: vec![
                ParamChange {
                    tick: 15,
                    velocity: 8,
                    timbre: 2,
                },
                ParamChange {
                    tick: 20,
                    velocity: 8,
                    timbre: 1,
                },
            ],
        };
        assert_eq!(note.params_at(10), (15, 2));
        assert_eq!(note.params_at(15), (8, 2));
        assert_eq!(note.params_at(29), (8, 1));
        assert!(note.contains(29));
        assert!(!note.contains(30));
    }
}
