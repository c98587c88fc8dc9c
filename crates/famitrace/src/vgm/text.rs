//! Raw register-write listing of an event log.
//!
//! ```text
//! log clock=1789773 length=44100
//! ram c000 55aa55aa
//! w 0 15 0f
//! loop 735
//! w 735 00 bf
//! ```
//!
//! Each `w` line is one write at an absolute tick, register id and value in
//! hex. The listing is lossless with respect to `replay`.
use std::fmt::Write as _;

use super::command::Command;
use super::document::{EventLog, EventLogBuilder};
use crate::chip::{RamBlock, Register};
use crate::error::{Error, Result};
use crate::textfmt::{self, hex_bytes, parse_hex_bytes};

pub fn to_text(log: &EventLog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "log clock={} length={}", log.clock(), log.total_ticks());
    let mut tick = 0u64;
    for (index, command) in log.iter().enumerate() {
        if Some(index) == log.loop_index() {
            let _ = writeln!(out, "loop {tick}");
        }
        match command {
            Command::Write { register, value } => {
                let _ = writeln!(out, "w {tick} {:02x} {value:02x}", register.id());
            }
            Command::Unsupported { register, value } => {
                let _ = writeln!(out, "w {tick} {register:02x} {value:02x}");
            }
            Command::RamWrite(block) => {
                let _ = writeln!(out, "ram {:04x} {}", block.address, hex_bytes(&block.data));
            }
            Command::Wait(n) => tick += *n as u64,
            Command::End => break,
        }
    }
    if log.loop_index() == Some(log.commands().len()) {
        let _ = writeln!(out, "loop {tick}");
    }
    out
}

pub fn from_text(text: &str) -> Result<EventLog> {
    let mut lines = textfmt::lines(text);
    let header = lines
        .next()
        .ok_or_else(|| Error::syntax(1, 1, "empty listing"))?;
    if header.keyword() != "log" {
        return Err(header.error_at(header.field(0)?, "expected \"log\" header"));
    }
    header.expect_len(3)?;
    let clock = header.parse_clock(1)?;
    let length = header.parse_length(2)?;

    let mut builder = EventLogBuilder::new(clock);
    let mut now = 0u64;
    let mut advance = |builder: &mut EventLogBuilder, line: &textfmt::Line<'_>| -> Result<()> {
        let tick: u64 = line.parse(1, "tick")?;
        if tick < now || tick > length {
            return Err(line.error_at(
                line.field(1)?,
                format!("tick {tick} outside {now}..={length}"),
            ));
        }
        builder.wait_long(tick - now);
        now = tick;
        Ok(())
    };

    for line in lines {
        match line.keyword() {
            "w" => {
                line.expect_len(4)?;
                advance(&mut builder, &line)?;
                let id: u8 = line.parse_hex_as(2, "register")?;
                let value: u8 = line.parse_hex_as(3, "value")?;
                match Register::try_from(id) {
                    Ok(register) => builder.write(register, value),
                    Err(_) => builder.push(Command::Unsupported {
                        register: id,
                        value,
                    }),
                };
            }
            "loop" => {
                line.expect_len(2)?;
                advance(&mut builder, &line)?;
                builder.mark_loop();
            }
            "ram" => {
                line.expect_len(3)?;
                let address: u16 = line.parse_hex_as(1, "address")?;
                builder.ram(RamBlock {
                    address,
                    data: parse_hex_bytes(&line, 2)?,
                });
            }
            other => {
                return Err(line.error_at(line.field(0)?, format!("unknown record {other:?}")));
            }
        }
    }
    builder.wait_long(length - now);
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::NTSC_CLOCK;

    #[test]
    fn listing_round_trips() {
        let mut b = EventLogBuilder::new(NTSC_CLOCK);
        b.ram(RamBlock {
            address: 0xC000,
            data: vec![0x55, 0xAA],
        })
        .write(Register::Status, 0x01)
        .wait(10)
        .mark_loop()
        .write(Register::Pulse1Control, 0xBF)
        .wait(5);
        let log = b.finish();
        let text = to_text(&log);
        assert!(text.contains("loop 10\nw 10 00 bf\n"));
        let back = from_text(&text).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn backwards_tick_is_rejected() {
        let text = "log clock=1789773 length=20\nw 10 15 01\nw 5 15 00\n";
        let err = from_text(text).unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 3, column: 3, .. }));
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let text = "log clock=1789773 length=20\nx 1 2 3\n";
        assert!(matches!(
            from_text(text),
            Err(Error::Syntax { line: 2, column: 1, .. })
        ));
    }
}
