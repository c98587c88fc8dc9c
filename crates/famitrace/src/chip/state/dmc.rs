//! DMC channel state ($4010-$4013).
//!
//! At control rate the emulator only tracks how many sample bytes remain,
//! consuming one byte per eight output bits at the selected rate. The
//! synthesizer reads the actual bits.
use crate::chip::tables::{DMC_RATE_TABLE, dmc_sample_address, dmc_sample_bytes};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DmcState {
    pub regs: [u8; 4],
    pub bytes_remaining: u16,
    /// Level set by the last direct load.
    pub output_level: u8,
    /// CPU cycles spent on the byte currently playing.
    pub byte_cycles: u32,
    /// A sample (re)started during this tick.
    pub restarted: bool,
}

impl DmcState {
    pub fn loop_flag(&self) -> bool {
        self.regs[0] & 0x40 != 0
    }

    pub fn rate_index(&self) -> u8 {
        self.regs[0] & 0x0F
    }

    pub fn sample_address(&self) -> u16 {
        dmc_sample_address(self.regs[2])
    }

    pub fn sample_length(&self) -> u16 {
        dmc_sample_bytes(self.regs[3])
    }

    pub(crate) fn write(&mut self, slot: usize, value: u8) {
        self.regs[slot] = value;
        if slot == 1 {
            self.output_level = value & 0x7F;
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.bytes_remaining = 0;
            self.byte_cycles = 0;
        } else if self.bytes_remaining == 0 {
            self.bytes_remaining = self.sample_length();
            self.byte_cycles = 0;
            self.restarted = true;
        }
    }

    pub(crate) fn advance(&mut self, cycles: u32) {
        if self.bytes_remaining == 0 {
            return;
        }
        let per_byte = DMC_RATE_TABLE[self.rate_index() as usize] as u32 * 8;
        self.byte_cycles += cycles;
        while self.byte_cycles >= per_byte && self.bytes_remaining > 0 {
            self.byte_cycles -= per_byte;
            self.bytes_remaining -= 1;
            if self.bytes_remaining == 0 && self.loop_flag() {
                self.bytes_remaining = self.sample_length();
            }
        }
        if self.bytes_remaining == 0 {
            self.byte_cycles = 0;
        }
    }

    pub fn is_sounding(&self) -> bool {
        self.bytes_remaining > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_byte_sample_ends_after_eight_bits() {
        let mut d = DmcState::default();
        d.write(0, 0x0F); // fastest rate, 54 cycles per bit
        d.set_enabled(true);
        assert!(d.restarted);
        assert_eq!(d.bytes_remaining, 1);
        d.advance(54 * 8 - 1);
        assert!(d.is_sounding());
        d.advance(1);
        assert!(!d.is_sounding());
    }

    #[test]
    fn enabling_while_playing_does_not_restart() {
        let mut d = DmcState::default();
        d.write(3, 0x01);
        d.set_enabled(true);
        d.restarted = false;
        d.advance(428 * 8);
        d.set_enabled(true);
        assert!(!d.restarted);
        assert_eq!(d.bytes_remaining, 16);
    }
}
