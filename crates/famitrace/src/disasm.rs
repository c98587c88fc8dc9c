//! Disassembler: per-tick register state to notes and back.
//!
//! `segment` scans each channel of a `Timeline` and cuts it into
//! `NoteEvent`s using the silence policy of the channel; `emit` writes the
//! notes back as canonical register writes and replays them.
//!
//! # Example
//!
//! ```
//! use famitrace::chip::{Channel, Register, replay};
//! use famitrace::disasm::{Pitch, segment};
//! use famitrace::vgm::EventLogBuilder;
//!
//! let mut builder = EventLogBuilder::new(famitrace::chip::NTSC_CLOCK);
//! builder
//!     .write(Register::Status, 0x01)
//!     .write(Register::Pulse1Control, 0xBF)
//!     .write(Register::Pulse1Sweep, 0x08)
//!     .write(Register::Pulse1TimerLow, 0xFD)
//!     .write(Register::Pulse1TimerHigh, 0x08)
//!     .wait(1000);
//! let notes = segment(&replay(&builder.finish()));
//!
//! let note = notes.channel(Channel::Pulse1).next().unwrap();
//! assert_eq!((note.onset, note.duration), (0, 1000));
//! assert_eq!(note.pitch, Pitch::Period(0xFD));
//! ```
pub mod emit;
pub mod note;
pub mod segment;
pub mod text;

pub use emit::{emit, emit_log};
pub use note::{NoteEvent, NoteStream, ParamChange, Pitch};
pub use segment::{Voice, segment, voice};
