//! Pulse channel state ($4000-$4003 / $4004-$4007).
use super::Envelope;
use crate::chip::tables::LENGTH_TABLE;

/// Register file and derived control state of one pulse channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PulseState {
    /// Last written byte of each of the four registers.
    pub regs: [u8; 4],
    /// Enable bit from the status register.
    pub enabled: bool,
    pub length_counter: u8,
    pub envelope: Envelope,
    /// Current timer period; the sweep unit rewrites it.
    pub period: u16,
    pub sweep_divider: u8,
    pub sweep_reload: bool,
    /// Pulse 1 negates with one's complement, pulse 2 with two's complement.
    pub ones_complement: bool,
}

impl PulseState {
    pub fn new(ones_complement: bool) -> Self {
        Self {
            ones_complement,
            ..Self::default()
        }
    }

    pub fn duty(&self) -> u8 {
        self.regs[0] >> 6
    }

    /// Length counter halt, which doubles as the envelope loop flag.
    pub fn length_halt(&self) -> bool {
        self.regs[0] & 0x20 != 0
    }

    pub fn constant_volume(&self) -> bool {
        self.regs[0] & 0x10 != 0
    }

    /// Constant volume, or envelope divider period.
    pub fn volume_param(&self) -> u8 {
        self.regs[0] & 0x0F
    }

    pub fn sweep_enabled(&self) -> bool {
        self.regs[1] & 0x80 != 0
    }

    pub fn sweep_period(&self) -> u8 {
        (self.regs[1] >> 4) & 0x07
    }

    pub fn sweep_negate(&self) -> bool {
        self.regs[1] & 0x08 != 0
    }

    pub fn sweep_shift(&self) -> u8 {
        self.regs[1] & 0x07
    }

    pub(crate) fn write(&mut self, slot: usize, value: u8) {
        self.regs[slot] = value;
        match slot {
            0 => {}
            1 => self.sweep_reload = true,
            2 => self.period = (self.period & 0x0700) | value as u16,
            _ => {
                self.period = (self.period & 0x00FF) | ((value as u16 & 0x07) << 8);
                if self.enabled {
                    self.length_counter = LENGTH_TABLE[(value >> 3) as usize];
                }
                self.envelope.restart(self.volume_param());
            }
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter = 0;
        }
    }

    /// Period the sweep unit would move to; computed continuously.
    pub fn sweep_target(&self) -> u16 {
        let change = self.period >> self.sweep_shift();
        if self.sweep_negate() {
            let borrow = u16::from(self.ones_complement);
            self.period.saturating_sub(change).saturating_sub(borrow)
        } else {
            self.period + change
        }
    }

    /// The hardware mutes on a too-small period or an overflowing sweep
    /// target, whether or not the sweep unit is enabled.
    pub fn is_muted(&self) -> bool {
        self.period < 8 || self.sweep_target() > 0x7FF
    }

    pub(crate) fn clock_quarter(&mut self) {
        let (halt, param) = (self.length_halt(), self.volume_param());
        self.envelope.clock(halt, param);
    }

    pub(crate) fn clock_half(&mut self) {
        if !self.length_halt() && self.length_counter > 0 {
            self.length_counter -= 1;
        }
        if self.sweep_divider == 0
            && self.sweep_enabled()
            && self.sweep_shift() > 0
            && !self.is_muted()
        {
            self.period = self.sweep_target();
        }
        if self.sweep_divider == 0 || self.sweep_reload {
            self.sweep_divider = self.sweep_period();
            self.sweep_reload = false;
        } else {
            self.sweep_divider -= 1;
        }
    }

    /// Volume currently reaching the mixer, 0 when silent.
    pub fn output_volume(&self) -> u8 {
        if !self.enabled || self.length_counter == 0 || self.is_muted() {
            return 0;
        }
        self.envelope.level(self.constant_volume(), self.volume_param())
    }

    pub fn is_sounding(&self) -> bool {
        self.output_volume() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(period: u16) -> PulseState {
        let mut p = PulseState::new(true);
        p.set_enabled(true);
        p.write(0, 0xBF); // duty 2, halt, constant volume 15
        p.write(2, (period & 0xFF) as u8);
        p.write(3, (period >> 8) as u8 | 0x08);
        p
    }

    #[test]
    fn length_load_requires_enable() {
        let mut p = PulseState::new(false);
        p.write(3, 0x08);
        assert_eq!(p.length_counter, 0);
        p.set_enabled(true);
        p.write(3, 0x08);
        assert_eq!(p.length_counter, LENGTH_TABLE[1]);
    }

    #[test]
    fn high_periods_mute_without_negate() {
        let p = playing(0x500);
        assert!(p.is_muted());
        let mut q = playing(0x500);
        q.write(1, 0x08);
        assert!(!q.is_muted());
        assert_eq!(q.output_volume(), 15);
    }

    #[test]
    fn sweep_lowers_period_on_half_frames() {
        let mut p = playing(0x200);
        p.write(1, 0x89); // enabled, period 0, negate, shift 1
        p.clock_half();
        assert_eq!(p.period, 0x200 - 0x100 - 1);
    }

    #[test]
    fn halted_length_holds() {
        let mut p = playing(0x100);
        let before = p.length_counter;
        p.clock_half();
        assert_eq!(p.length_counter, before);
        p.write(0, 0x9F);
        p.clock_half();
        assert_eq!(p.length_counter, before - 1);
    }
}
