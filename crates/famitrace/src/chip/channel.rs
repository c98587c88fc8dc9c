//! The closed set of APU channels.
use std::fmt;
use std::str::FromStr;

/// One of the five APU channels. Fixed, never extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Pulse1,
    Pulse2,
    Triangle,
    Noise,
    Dmc,
}

impl Channel {
    /// All channels in register order.
    pub const ALL: [Channel; 5] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
        Channel::Dmc,
    ];

    /// The four channels that carry a pitch.
    pub const PITCHED: [Channel; 4] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
    ];

    /// Index in register order (0-4).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit of this channel in the status register (0x15).
    pub fn status_bit(self) -> u8 {
        1 << self.index()
    }

    /// Short name used by the text transcriptions.
    pub fn short_name(self) -> &'static str {
        match self {
            Channel::Pulse1 => "p1",
            Channel::Pulse2 => "p2",
            Channel::Triangle => "tr",
            Channel::Noise => "no",
            Channel::Dmc => "dmc",
        }
    }

    /// Pulse 1 anchors timing reconstruction and can never be suppressed.
    pub fn is_suppressible(self) -> bool {
        self != Channel::Pulse1
    }

    pub fn is_pulse(self) -> bool {
        matches!(self, Channel::Pulse1 | Channel::Pulse2)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.short_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown channel '{s}'"))
    }
}

/// A set of channels, stored as status-register bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ChannelSet(u8);

impl ChannelSet {
    pub const fn empty() -> Self {
        ChannelSet(0)
    }

    pub fn with(mut self, channel: Channel) -> Self {
        self.insert(channel);
        self
    }

    pub fn insert(&mut self, channel: Channel) {
        self.0 |= channel.status_bit();
    }

    pub fn contains(self, channel: Channel) -> bool {
        self.0 & channel.status_bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Status-register mask covering the channels in the set.
    pub fn status_mask(self) -> u8 {
        self.0
    }

    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        iter.into_iter().fold(ChannelSet::empty(), ChannelSet::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for ch in Channel::ALL {
            assert_eq!(ch.short_name().parse::<Channel>().unwrap(), ch);
        }
        assert!("p3".parse::<Channel>().is_err());
    }

    #[test]
    fn set_membership() {
        let set: ChannelSet = [Channel::Noise, Channel::Dmc].into_iter().collect();
        assert!(set.contains(Channel::Noise));
        assert!(!set.contains(Channel::Triangle));
        assert_eq!(set.status_mask(), 0x18);
        assert_eq!(set.iter().count(), 2);
    }
}
