//! Triangle channel state ($4008-$400B).
use crate::chip::tables::LENGTH_TABLE;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriangleState {
    /// Register bytes by slot; slot 1 ($4009) does not exist.
    pub regs: [u8; 4],
    pub enabled: bool,
    pub length_counter: u8,
    pub linear_counter: u8,
    pub linear_reload: bool,
    pub period: u16,
}

impl TriangleState {
    /// Control flag: halts the length counter and keeps the linear
    /// counter reloading.
    pub fn control(&self) -> bool {
        self.regs[0] & 0x80 != 0
    }

    pub fn linear_load(&self) -> u8 {
        self.regs[0] & 0x7F
    }

    pub(crate) fn write(&mut self, slot: usize, value: u8) {
        self.regs[slot] = value;
        match slot {
            2 => self.period = (self.period & 0x0700) | value as u16,
            3 => {
                self.period = (self.period & 0x00FF) | ((value as u16 & 0x07) << 8);
                if self.enabled {
                    self.length_counter = LENGTH_TABLE[(value >> 3) as usize];
                }
                // Loaded at write time so onsets stay tick-exact.
                self.linear_reload = true;
                self.linear_counter = self.linear_load();
            }
            _ => {}
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter = 0;
        }
    }

    pub(crate) fn clock_quarter(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_load();
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control() {
            self.linear_reload = false;
        }
    }

    pub(crate) fn clock_half(&mut self) {
        if !self.control() && self.length_counter > 0 {
            self.length_counter -= 1;
        }
    }

    /// Periods below 2 run ultrasonic and are treated as silence.
    pub fn is_sounding(&self) -> bool {
        self.enabled && self.length_counter > 0 && self.linear_counter > 0 && self.period >= 2
    }
}
