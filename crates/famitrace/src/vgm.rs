//! Event codec: the binary register-write log (a VGM subset) and its
//! reductions.
//!
//! `decode` accepts any VGM stream carrying NES APU writes. Records for
//! other chips are skipped, so the decoded `EventLog` holds only APU
//! writes, waits, APU RAM blocks and the loop point. `encode` produces a
//! minimal, deterministic re-encoding of that log.
pub mod command;
pub mod document;
pub mod header;
pub(crate) mod parser;
pub mod reduce;
pub mod text;

pub use command::Command;
pub use document::{EventLog, EventLogBuilder};
pub use header::LogHeader;
pub use reduce::{ReduceOptions, TruncateOptions, suppress_channels, truncate};

use crate::error::Result;

/// Decode an event log from its binary form.
pub fn decode(bytes: &[u8]) -> Result<EventLog> {
    parser::parse_log(bytes)
}

/// Encode an event log into its binary form.
pub fn encode(log: &EventLog) -> Vec<u8> {
    log.to_bytes()
}
