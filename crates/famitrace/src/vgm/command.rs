//! Event-log records.
use crate::chip::{RamBlock, Register};

/// One record of an event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register write to the primary APU (`0xB4 aa dd`).
    Write { register: Register, value: u8 },
    /// Write to an id the APU does not define. Kept so the emulator can
    /// report it with its tick; never re-encoded.
    Unsupported { register: u8, value: u8 },
    /// Advance time by the given number of ticks.
    Wait(u32),
    /// APU RAM data block holding DMC sample bytes.
    RamWrite(RamBlock),
    /// End-of-data marker (`0x66`).
    End,
}

impl Command {
    pub fn write(register: Register, value: u8) -> Self {
        Command::Write { register, value }
    }

    /// Ticks this record advances time by.
    pub fn ticks(&self) -> u64 {
        match self {
            Command::Wait(n) => *n as u64,
            _ => 0,
        }
    }
}
