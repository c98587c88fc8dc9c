//! Delta modulation sample player.
use crate::chip::memory::{SAMPLE_BASE, SAMPLE_WINDOW};
use crate::chip::tables::DMC_RATE_TABLE;
use crate::chip::{Register, RegisterState};

/// DMC output unit reading 1-bit deltas from the sample image.
///
/// Each output clock moves the 7-bit level by +2 or -2, saturating at the
/// ends of the range. A direct load sets the level outright.
#[derive(Clone, Debug)]
pub(crate) struct DmcGenerator {
    image: Vec<u8>,
    timer: u16,
    period: u16,
    level: u8,
    shift: u8,
    bits_left: u8,
    /// The shift register holds no sample data.
    silent: bool,
    address: u16,
    bytes_remaining: u16,
    looping: bool,
    restart_address: u16,
    restart_length: u16,
}

impl DmcGenerator {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            timer: 0,
            period: DMC_RATE_TABLE[0],
            level: 0,
            shift: 0,
            bits_left: 8,
            silent: true,
            address: 0,
            bytes_remaining: 0,
            looping: false,
            restart_address: 0,
            restart_length: 0,
        }
    }

    pub fn begin_tick(&mut self, state: &RegisterState) {
        let dmc = &state.dmc;
        self.period = DMC_RATE_TABLE[dmc.rate_index() as usize];
        self.looping = dmc.loop_flag();
        self.restart_address = dmc.sample_address();
        self.restart_length = dmc.sample_length();
        if state.was_touched(Register::DmcDirectLoad) {
            self.level = dmc.output_level;
        }
        if state.dmc_restarted() {
            self.address = self.restart_address;
            self.bytes_remaining = self.restart_length;
        } else if !dmc.is_sounding() {
            self.bytes_remaining = 0;
        }
    }

    fn fetch(&mut self) -> Option<u8> {
        if self.bytes_remaining == 0 {
            return None;
        }
        let offset = self.address.wrapping_sub(SAMPLE_BASE) as usize % SAMPLE_WINDOW;
        let byte = self.image.get(offset).copied().unwrap_or(0);
        self.address = if self.address == 0xFFFF {
            SAMPLE_BASE
        } else {
            self.address + 1
        };
        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 && self.looping {
            self.address = self.restart_address;
            self.bytes_remaining = self.restart_length;
        }
        Some(byte)
    }

    #[inline]
    pub fn tick(&mut self) -> u8 {
        if self.timer > 0 {
            self.timer -= 1;
            return self.level;
        }
        self.timer = self.period - 1;
        if !self.silent {
            if self.shift & 1 != 0 {
                if self.level <= 125 {
                    self.level += 2;
                }
            } else if self.level >= 2 {
                self.level -= 2;
            }
        }
        self.shift >>= 1;
        self.bits_left -= 1;
        if self.bits_left == 0 {
            self.bits_left = 8;
            match self.fetch() {
                Some(byte) => {
                    self.shift = byte;
                    self.silent = false;
                }
                None => self.silent = true,
            }
        }
        self.level
    }
}
