//! Byte readers and writers used by the event log codec.
//!
//! Every reader reports a short buffer as `Error::MalformedStream` carrying
//! the offset of the failed access, so truncated headers and records are
//! reported precisely.
use crate::error::{Error, Result};

fn out_of_range(off: usize, needed: usize, available: usize) -> Error {
    Error::malformed(
        off,
        format!("needed {needed} bytes, {available} available"),
    )
}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32> {
    let slice = read_slice(bytes, off, 4)?;
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(slice);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16> {
    let slice = read_slice(bytes, off, 2)?;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

/// Read a single byte from `bytes` at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8> {
    bytes
        .get(off)
        .copied()
        .ok_or_else(|| out_of_range(off, 1, 0))
}

/// Return a borrowed slice of length `len` starting at `off` from `bytes`.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8]> {
    match off.checked_add(len) {
        Some(end) if end <= bytes.len() => Ok(&bytes[off..end]),
        _ => Err(out_of_range(off, len, bytes.len().saturating_sub(off))),
    }
}

/// Write a 32-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// Callers must ensure the destination range is valid.
pub fn write_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reads_report_offset() {
        let bytes = [0x01, 0x02, 0x03];
        assert_eq!(read_u16_le_at(&bytes, 1).unwrap(), 0x0302);
        match read_u32_le_at(&bytes, 1) {
            Err(Error::MalformedStream { offset, .. }) => assert_eq!(offset, 1),
            other => panic!("unexpected {:?}", other),
        }
        assert!(read_u8_at(&bytes, 3).is_err());
        assert!(read_slice(&bytes, usize::MAX, 2).is_err());
    }
}
