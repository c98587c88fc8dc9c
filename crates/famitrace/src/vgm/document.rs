//! In-memory event log, its builder and the encoder.
use super::command::Command;
use super::header::{HEADER_SIZE, LogHeader};
use super::parser;
use crate::chip::{NTSC_CLOCK, RamBlock, Register, SampleMemory};
use crate::error::Result;

/// APU write opcode.
pub(crate) const OP_WRITE: u8 = 0xB4;
pub(crate) const OP_WAIT: u8 = 0x61;
pub(crate) const OP_WAIT_735: u8 = 0x62;
pub(crate) const OP_WAIT_882: u8 = 0x63;
pub(crate) const OP_END: u8 = 0x66;
pub(crate) const OP_DATA_BLOCK: u8 = 0x67;
/// Data block type for NES APU RAM writes.
pub(crate) const BLOCK_APU_RAM: u8 = 0xC2;

/// A decoded event log: ordered records, an optional loop point and the
/// header metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    pub header: LogHeader,
    pub(crate) commands: Vec<Command>,
    /// Index of the first record replayed when looping.
    pub(crate) loop_index: Option<usize>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(NTSC_CLOCK)
    }
}

impl EventLog {
    pub fn new(clock: u32) -> Self {
        Self {
            header: LogHeader {
                clock,
                ..LogHeader::default()
            },
            commands: Vec::new(),
            loop_index: None,
        }
    }

    /// APU master clock in Hz.
    pub fn clock(&self) -> u32 {
        self.header.clock
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    pub fn loop_index(&self) -> Option<usize> {
        self.loop_index
    }

    /// Sum of all wait records.
    pub fn total_ticks(&self) -> u64 {
        self.commands.iter().map(Command::ticks).sum()
    }

    /// Tick at which the loop point sits.
    pub fn loop_tick(&self) -> Option<u64> {
        self.loop_index
            .map(|index| self.commands[..index].iter().map(Command::ticks).sum())
    }

    /// DMC sample memory built from every RAM block in the log.
    pub fn samples(&self) -> SampleMemory {
        let mut memory = SampleMemory::new();
        for command in &self.commands {
            if let Command::RamWrite(block) = command {
                memory.push(block.clone());
            }
        }
        memory
    }

    /// Serialize into a fresh version 1.61 stream.
    ///
    /// Waits are merged and written with the shortest encoding, foreign and
    /// unsupported records are dropped, and the header's sample counts and
    /// loop offset are recomputed. The output is deterministic.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut pending: u64 = 0;
        let mut total: u64 = 0;
        let mut loop_pos = None;
        let mut loop_tick = 0;

        for (index, command) in self.commands.iter().enumerate() {
            if Some(index) == self.loop_index {
                push_wait(&mut data, pending);
                pending = 0;
                loop_pos = Some(data.len());
                loop_tick = total;
            }
            match command {
                Command::Wait(n) => {
                    pending += *n as u64;
                    total += *n as u64;
                }
                Command::Write { register, value } => {
                    push_wait(&mut data, pending);
                    pending = 0;
                    data.extend_from_slice(&[OP_WRITE, register.id(), *value]);
                }
                Command::RamWrite(block) => {
                    push_wait(&mut data, pending);
                    pending = 0;
                    push_ram_block(&mut data, block);
                }
                Command::Unsupported { .. } => {}
                Command::End => break,
            }
        }
        if self.loop_index == Some(self.commands.len()) {
            push_wait(&mut data, pending);
            pending = 0;
            loop_pos = Some(data.len());
            loop_tick = total;
        }
        push_wait(&mut data, pending);
        data.push(OP_END);

        let header = LogHeader {
            clock: self.header.clock,
            total_samples: sample_count(total),
            loop_start: loop_pos.map(|pos| HEADER_SIZE + pos),
            loop_samples: sample_count(total - loop_tick),
            ..LogHeader::default()
        };
        let mut bytes = header.to_bytes(data.len());
        bytes.extend_from_slice(&data);
        bytes
    }
}

/// Header sample count; the 32-bit fields saturate on longer tracks while
/// the wait records still carry every tick.
fn sample_count(ticks: u64) -> u32 {
    u32::try_from(ticks).unwrap_or_else(|_| {
        tracing::debug!(ticks, "sample count exceeds the header field");
        u32::MAX
    })
}

/// Emit `ticks` of delay with the fewest bytes.
fn push_wait(data: &mut Vec<u8>, mut ticks: u64) {
    while ticks > 0 {
        let chunk = ticks.min(u16::MAX as u64) as u32;
        ticks -= chunk as u64;
        match chunk {
            1..=16 => data.push(0x70 | (chunk - 1) as u8),
            17..=32 => data.extend_from_slice(&[0x7F, 0x70 | (chunk - 17) as u8]),
            735 => data.push(OP_WAIT_735),
            882 => data.push(OP_WAIT_882),
            1470 => data.extend_from_slice(&[OP_WAIT_735, OP_WAIT_735]),
            1617 => data.extend_from_slice(&[OP_WAIT_735, OP_WAIT_882]),
            1764 => data.extend_from_slice(&[OP_WAIT_882, OP_WAIT_882]),
            736..=751 => data.extend_from_slice(&[OP_WAIT_735, 0x70 | (chunk - 736) as u8]),
            883..=898 => data.extend_from_slice(&[OP_WAIT_882, 0x70 | (chunk - 883) as u8]),
            _ => {
                data.push(OP_WAIT);
                data.extend_from_slice(&(chunk as u16).to_le_bytes());
            }
        }
    }
}

fn push_ram_block(data: &mut Vec<u8>, block: &RamBlock) {
    data.extend_from_slice(&[OP_DATA_BLOCK, OP_END, BLOCK_APU_RAM]);
    data.extend_from_slice(&(block.data.len() as u32 + 2).to_le_bytes());
    data.extend_from_slice(&block.address.to_le_bytes());
    data.extend_from_slice(&block.data);
}

/// Decode an event log from its binary form.
impl TryFrom<&[u8]> for EventLog {
    type Error = crate::error::Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        parser::parse_log(bytes)
    }
}

impl From<&EventLog> for Vec<u8> {
    fn from(log: &EventLog) -> Vec<u8> {
        log.to_bytes()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Incremental construction of an `EventLog`.
///
/// Consecutive waits are merged as they are added. `mark_loop` records the
/// position of the next record as the loop point.
#[derive(Debug, Clone)]
pub struct EventLogBuilder {
    log: EventLog,
}

impl EventLogBuilder {
    pub fn new(clock: u32) -> Self {
        Self {
            log: EventLog::new(clock),
        }
    }

    pub fn write(&mut self, register: Register, value: u8) -> &mut Self {
        self.log.commands.push(Command::write(register, value));
        self
    }

    pub fn wait(&mut self, ticks: u32) -> &mut Self {
        if ticks == 0 {
            return self;
        }
        let mergeable = self.log.loop_index != Some(self.log.commands.len());
        match self.log.commands.last_mut() {
            Some(Command::Wait(n)) if mergeable && n.checked_add(ticks).is_some() => *n += ticks,
            _ => self.log.commands.push(Command::Wait(ticks)),
        }
        self
    }

    /// Wait of any length, split into as many records as it takes.
    pub fn wait_long(&mut self, mut ticks: u64) -> &mut Self {
        while ticks > 0 {
            let chunk = ticks.min(u64::from(u32::MAX));
            self.wait(chunk as u32);
            ticks -= chunk;
        }
        self
    }

    pub fn ram(&mut self, block: RamBlock) -> &mut Self {
        self.log.commands.push(Command::RamWrite(block));
        self
    }

    /// Push a record as is.
    pub fn push(&mut self, command: Command) -> &mut Self {
        match command {
            Command::Wait(n) => self.wait(n),
            other => {
                self.log.commands.push(other);
                self
            }
        }
    }

    pub fn mark_loop(&mut self) -> &mut Self {
        self.log.loop_index = Some(self.log.commands.len());
        self
    }

    /// Close the log with an end marker and fill in the header counts.
    pub fn finish(mut self) -> EventLog {
        if self.log.commands.last() != Some(&Command::End) {
            self.log.commands.push(Command::End);
        }
        let total = self.log.total_ticks();
        self.log.header.total_samples = sample_count(total);
        self.log.header.loop_samples = self
            .log
            .loop_tick()
            .map(|tick| sample_count(total - tick))
            .unwrap_or(0);
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_wait(ticks: u64) -> Vec<u8> {
        let mut data = Vec::new();
        push_wait(&mut data, ticks);
        data
    }

    #[test]
    fn waits_use_short_forms() {
        assert_eq!(encoded_wait(1), vec![0x70]);
        assert_eq!(encoded_wait(16), vec![0x7F]);
        assert_eq!(encoded_wait(20), vec![0x7F, 0x73]);
        assert_eq!(encoded_wait(735), vec![0x62]);
        assert_eq!(encoded_wait(1617), vec![0x62, 0x63]);
        assert_eq!(encoded_wait(1000), vec![0x61, 0xE8, 0x03]);
        assert_eq!(encoded_wait(70000).len(), 6);
    }

    #[test]
    fn builder_merges_waits_but_not_across_loop() {
        let mut builder = EventLogBuilder::new(NTSC_CLOCK);
        builder.wait(10).wait(5).mark_loop().wait(7).wait(3);
        let log = builder.finish();
        assert_eq!(
            log.commands(),
            &[Command::Wait(15), Command::Wait(10), Command::End]
        );
        assert_eq!(log.loop_tick(), Some(15));
        assert_eq!(log.header.loop_samples, 10);
        assert_eq!(log.total_ticks(), 25);
    }

    #[test]
    fn long_waits_split_and_saturate_the_header() {
        let ticks = u64::from(u32::MAX) + 5;
        let mut builder = EventLogBuilder::new(NTSC_CLOCK);
        builder.wait_long(ticks);
        let log = builder.finish();
        assert_eq!(
            log.commands(),
            &[Command::Wait(u32::MAX), Command::Wait(5), Command::End]
        );
        assert_eq!(log.total_ticks(), ticks);
        assert_eq!(log.header.total_samples, u32::MAX);
    }

    #[test]
    fn encoder_drops_unsupported_writes() {
        let mut builder = EventLogBuilder::new(NTSC_CLOCK);
        builder
            .push(Command::Unsupported {
                register: 0x09,
                value: 1,
            })
            .write(Register::Status, 0x01)
            .wait(2);
        let bytes = builder.finish().to_bytes();
        assert_eq!(&bytes[HEADER_SIZE..], &[0xB4, 0x15, 0x01, 0x71, 0x66]);
    }
}
