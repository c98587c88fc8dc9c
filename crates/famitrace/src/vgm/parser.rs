//! Event-log decoder.
//!
//! Parses the header, then walks the record stream until the end marker,
//! the GD3 tag or the end of the buffer. APU records become `Command`s;
//! records for other chips are skipped by their known operand length so
//! multi-chip logs still decode. Any opcode without a known length makes
//! the stream malformed.
use super::command::Command;
use super::document::{
    BLOCK_APU_RAM, EventLog, OP_DATA_BLOCK, OP_END, OP_WAIT, OP_WAIT_735, OP_WAIT_882, OP_WRITE,
};
use super::header::LogHeader;
use crate::binutil::{read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::chip::{RamBlock, Register};
use crate::error::{Error, Result};

/// Secondary-chip flag in the register byte of an APU write.
const SECOND_CHIP: u8 = 0x80;
/// Data block sizes carry a "second chip" flag in bit 31.
const BLOCK_SIZE_MASK: u32 = 0x7FFF_FFFF;

/// Result of decoding one record.
enum Record {
    Command(Command),
    Foreign,
}

/// Operand length of records belonging to other chips or to the DAC
/// stream control, excluding the opcode byte.
fn foreign_operand_len(op: u8) -> Option<usize> {
    match op {
        0x30..=0x3F | 0x4F | 0x50 | 0x94 => Some(1),
        0x40..=0x4E | 0x51..=0x5F | 0xA0..=0xBF => Some(2),
        0xC0..=0xDF => Some(3),
        0xE0..=0xFF | 0x90 | 0x91 | 0x95 => Some(4),
        0x92 => Some(5),
        0x93 => Some(10),
        0x68 => Some(11),
        _ => None,
    }
}

/// Decode one record at `off`, returning it and its size in bytes.
fn parse_record(bytes: &[u8], off: usize) -> Result<(Record, usize)> {
    let op = read_u8_at(bytes, off)?;
    let record = match op {
        OP_WRITE => {
            let operands = read_slice(bytes, off + 1, 2)?;
            let (id, value) = (operands[0], operands[1]);
            if id & SECOND_CHIP != 0 {
                tracing::debug!(offset = off, id, "skipping secondary APU write");
                return Ok((Record::Foreign, 3));
            }
            let command = match Register::try_from(id) {
                Ok(register) => Command::Write { register, value },
                Err(_) => Command::Unsupported {
                    register: id,
                    value,
                },
            };
            return Ok((Record::Command(command), 3));
        }
        OP_WAIT => {
            let n = read_u16_le_at(bytes, off + 1)?;
            return Ok((Record::Command(Command::Wait(n as u32)), 3));
        }
        OP_WAIT_735 => Command::Wait(735),
        OP_WAIT_882 => Command::Wait(882),
        OP_END => Command::End,
        0x70..=0x7F => Command::Wait((op & 0x0F) as u32 + 1),
        // YM2612 DAC write and wait; only the wait matters here.
        0x80..=0x8F => match op & 0x0F {
            0 => return Ok((Record::Foreign, 1)),
            n => Command::Wait(n as u32),
        },
        OP_DATA_BLOCK => return parse_data_block(bytes, off),
        _ => match foreign_operand_len(op) {
            Some(len) => {
                read_slice(bytes, off + 1, len)?;
                tracing::debug!(offset = off, op, "skipping foreign record");
                return Ok((Record::Foreign, 1 + len));
            }
            None => return Err(Error::malformed(off, format!("invalid opcode 0x{op:02X}"))),
        },
    };
    Ok((Record::Command(record), 1))
}

/// `0x67 0x66 tt ssssssss <data>`.
fn parse_data_block(bytes: &[u8], off: usize) -> Result<(Record, usize)> {
    if read_u8_at(bytes, off + 1)? != OP_END {
        return Err(Error::malformed(off + 1, "data block without 0x66 guard"));
    }
    let kind = read_u8_at(bytes, off + 2)?;
    let size = (read_u32_le_at(bytes, off + 3)? & BLOCK_SIZE_MASK) as usize;
    let payload = read_slice(bytes, off + 7, size)?;
    let consumed = 7 + size;
    if kind != BLOCK_APU_RAM {
        tracing::debug!(offset = off, kind, size, "skipping foreign data block");
        return Ok((Record::Foreign, consumed));
    }
    if size < 2 {
        return Err(Error::malformed(off + 3, "APU RAM block shorter than its address"));
    }
    let block = RamBlock {
        address: u16::from_le_bytes([payload[0], payload[1]]),
        data: payload[2..].to_vec(),
    };
    Ok((Record::Command(Command::RamWrite(block)), consumed))
}

/// Parse a complete event log.
pub(crate) fn parse_log(bytes: &[u8]) -> Result<EventLog> {
    let header = LogHeader::parse(bytes)?;
    let stop = header.gd3_start.unwrap_or(bytes.len()).min(bytes.len());

    let mut commands = Vec::new();
    let mut loop_index = None;
    let mut off = header.data_start;
    let mut ended = false;

    while off < stop {
        if header.loop_start == Some(off) {
            loop_index = Some(commands.len());
        }
        let (record, consumed) = parse_record(bytes, off)?;
        off += consumed;
        if let Record::Command(command) = record {
            let end = command == Command::End;
            commands.push(command);
            if end {
                ended = true;
                break;
            }
        }
    }
    if !ended {
        return Err(Error::malformed(off, "missing end-of-data marker"));
    }

    if let Some(start) = header.loop_start
        && loop_index.is_none()
    {
        return Err(Error::malformed(
            start,
            "loop offset does not point at a record boundary",
        ));
    }

    tracing::trace!(
        records = commands.len(),
        loop_index = ?loop_index,
        clock = header.clock,
        "decoded event log"
    );
    Ok(EventLog {
        header,
        commands,
        loop_index,
    })
}
