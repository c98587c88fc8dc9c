//! Event-log header.
//!
//! Only the fields the transcoder needs are modelled. The encoder always
//! writes a version 1.61 header of `HEADER_SIZE` bytes; everything else in
//! that block is zero.
use crate::binutil::{read_slice, read_u32_le_at, write_u32};
use crate::chip::NTSC_CLOCK;
use crate::error::{Error, Result};

pub(crate) const IDENT: &[u8; 4] = b"Vgm ";
pub(crate) const HEADER_SIZE: usize = 0x100;
/// Smallest header any version can have.
pub(crate) const MIN_HEADER_SIZE: usize = 0x40;
pub(crate) const WRITE_VERSION: u32 = 0x161;

/// Header field byte offsets.
pub(crate) mod field {
    pub const EOF_OFFSET: usize = 0x04;
    pub const VERSION: usize = 0x08;
    pub const GD3_OFFSET: usize = 0x14;
    pub const TOTAL_SAMPLES: usize = 0x18;
    pub const LOOP_OFFSET: usize = 0x1C;
    pub const LOOP_SAMPLES: usize = 0x20;
    pub const DATA_OFFSET: usize = 0x34;
    pub const NES_APU_CLOCK: usize = 0x84;
}

/// Bit 31 selects a dual-chip setup, bit 30 the FDS add-on.
const CLOCK_MASK: u32 = 0x3FFF_FFFF;

/// Header metadata as read from a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    pub version: u32,
    /// APU master clock in Hz.
    pub clock: u32,
    pub total_samples: u32,
    /// Absolute byte offset of the loop point, if any.
    pub loop_start: Option<usize>,
    pub loop_samples: u32,
    /// Absolute byte offset of the first record.
    pub data_start: usize,
    /// Absolute byte offset of the GD3 tag, if any.
    pub gd3_start: Option<usize>,
}

impl Default for LogHeader {
    fn default() -> Self {
        Self {
            version: WRITE_VERSION,
            clock: NTSC_CLOCK,
            total_samples: 0,
            loop_start: None,
            loop_samples: 0,
            data_start: HEADER_SIZE,
            gd3_start: None,
        }
    }
}

/// Relative header offsets are stored from their own field position; zero
/// means absent.
fn relative(bytes: &[u8], field: usize) -> Result<Option<usize>> {
    let raw = read_u32_le_at(bytes, field)?;
    Ok((raw != 0).then(|| field + raw as usize))
}

impl LogHeader {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        let ident = read_slice(bytes, 0, 4)?;
        if ident != IDENT {
            return Err(Error::malformed(0, "missing \"Vgm \" identifier"));
        }
        read_slice(bytes, 0, MIN_HEADER_SIZE)?;

        let version = read_u32_le_at(bytes, field::VERSION)?;
        let data_start = match relative(bytes, field::DATA_OFFSET)? {
            Some(start) if version >= 0x150 => start,
            _ => MIN_HEADER_SIZE,
        };
        if data_start > bytes.len() {
            return Err(Error::malformed(
                field::DATA_OFFSET,
                format!("data offset 0x{data_start:X} past end of file"),
            ));
        }

        let clock = if data_start >= field::NES_APU_CLOCK + 4 {
            read_u32_le_at(bytes, field::NES_APU_CLOCK)? & CLOCK_MASK
        } else {
            0
        };
        let clock = if clock == 0 {
            tracing::debug!("no APU clock in header, assuming NTSC");
            NTSC_CLOCK
        } else {
            clock
        };

        Ok(Self {
            version,
            clock,
            total_samples: read_u32_le_at(bytes, field::TOTAL_SAMPLES)?,
            loop_start: relative(bytes, field::LOOP_OFFSET)?,
            loop_samples: read_u32_le_at(bytes, field::LOOP_SAMPLES)?,
            data_start,
            gd3_start: relative(bytes, field::GD3_OFFSET)?,
        })
    }

    /// Serialize a fresh header for a stream whose records occupy
    /// `data_len` bytes.
    pub(crate) fn to_bytes(&self, data_len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(IDENT);
        write_u32(&mut buf, field::EOF_OFFSET, (HEADER_SIZE + data_len - field::EOF_OFFSET) as u32);
        write_u32(&mut buf, field::VERSION, WRITE_VERSION);
        write_u32(&mut buf, field::TOTAL_SAMPLES, self.total_samples);
        if let Some(start) = self.loop_start {
            write_u32(&mut buf, field::LOOP_OFFSET, (start - field::LOOP_OFFSET) as u32);
            write_u32(&mut buf, field::LOOP_SAMPLES, self.loop_samples);
        }
        write_u32(&mut buf, field::DATA_OFFSET, (HEADER_SIZE - field::DATA_OFFSET) as u32);
        write_u32(&mut buf, field::NES_APU_CLOCK, self.clock);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_header_reads_back() {
        let header = LogHeader {
            total_samples: 1234,
            loop_start: Some(0x120),
            loop_samples: 99,
            ..LogHeader::default()
        };
        let bytes = header.to_bytes(0x40);
        let parsed = LogHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.clock, NTSC_CLOCK);
        assert_eq!(parsed.data_start, HEADER_SIZE);
        assert_eq!(parsed.total_samples, 1234);
        assert_eq!(parsed.loop_start, Some(0x120));
        assert_eq!(parsed.loop_samples, 99);
        assert_eq!(parsed.gd3_start, None);
    }

    #[test]
    fn old_versions_start_data_at_0x40() {
        let mut bytes = vec![0u8; 0x40];
        bytes[0..4].copy_from_slice(IDENT);
        write_u32(&mut bytes, field::VERSION, 0x110);
        let parsed = LogHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.data_start, 0x40);
        assert_eq!(parsed.clock, NTSC_CLOCK);
    }

    #[test]
    fn truncated_header_is_malformed() {
        let err = LogHeader::parse(b"Vgm \x00\x00").unwrap_err();
        assert!(matches!(err, Error::MalformedStream { .. }));
        let err = LogHeader::parse(&[0u8; 0x40]).unwrap_err();
        assert!(matches!(err, Error::MalformedStream { offset: 0, .. }));
    }
}
