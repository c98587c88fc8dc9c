//! Noise channel state ($400C-$400F).
use super::Envelope;
use crate::chip::tables::LENGTH_TABLE;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoiseState {
    /// Register bytes by slot; slot 1 ($400D) does not exist.
    pub regs: [u8; 4],
    pub enabled: bool,
    pub length_counter: u8,
    pub envelope: Envelope,
}

impl NoiseState {
    pub fn length_halt(&self) -> bool {
        self.regs[0] & 0x20 != 0
    }

    pub fn constant_volume(&self) -> bool {
        self.regs[0] & 0x10 != 0
    }

    pub fn volume_param(&self) -> u8 {
        self.regs[0] & 0x0F
    }

    /// Short-period LFSR mode (tap bit 6 instead of bit 1).
    pub fn mode(&self) -> bool {
        self.regs[2] & 0x80 != 0
    }

    pub fn period_index(&self) -> u8 {
        self.regs[2] & 0x0F
    }

    pub(crate) fn write(&mut self, slot: usize, value: u8) {
        self.regs[slot] = value;
        if slot == 3 {
            if self.enabled {
                self.length_counter = LENGTH_TABLE[(value >> 3) as usize];
            }
            self.envelope.restart(self.volume_param());
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter = 0;
        }
    }

    pub(crate) fn clock_quarter(&mut self) {
        let (halt, param) = (self.length_halt(), self.volume_param());
        self.envelope.clock(halt, param);
    }

    pub(crate) fn clock_half(&mut self) {
        if !self.length_halt() && self.length_counter > 0 {
            self.length_counter -= 1;
        }
    }

    pub fn output_volume(&self) -> u8 {
        if !self.enabled || self.length_counter == 0 {
            return 0;
        }
        self.envelope.level(self.constant_volume(), self.volume_param())
    }

    pub fn is_sounding(&self) -> bool {
        self.output_volume() > 0
    }
}
