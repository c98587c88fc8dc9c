//! Hardware lookup tables shared by the emulator and the synthesizer.

/// Length counter load values indexed by the 5-bit field of the length
/// registers (bits 7-3).
pub(crate) const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Noise timer periods (NTSC) in CPU cycles.
pub(crate) const NOISE_PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// DMC output bit periods (NTSC) in CPU cycles.
pub(crate) const DMC_RATE_TABLE: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// Pulse duty sequences, stepped 0..7.
pub(crate) const PULSE_DUTY: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0], // 12.5%
    [0, 1, 1, 0, 0, 0, 0, 0], // 25%
    [0, 1, 1, 1, 1, 0, 0, 0], // 50%
    [1, 0, 0, 1, 1, 1, 1, 1], // 25% negated
];

/// Triangle 32-step output sequence.
pub(crate) const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

/// Frame sequencer quarter-frame points in 4-step mode (CPU cycles).
pub(crate) const FRAME_4STEP: [u32; 4] = [7457, 14913, 22371, 29829];
/// 4-step sequence length.
pub(crate) const FRAME_4STEP_RESET: u32 = 29830;
/// Frame sequencer points in 5-step mode; 29829 produces no clock.
pub(crate) const FRAME_5STEP: [u32; 4] = [7457, 14913, 22371, 37281];
/// 5-step sequence length.
pub(crate) const FRAME_5STEP_RESET: u32 = 37282;

/// Number of bytes a DMC sample of the given length register spans.
pub(crate) fn dmc_sample_bytes(length_reg: u8) -> u16 {
    length_reg as u16 * 16 + 1
}

/// Absolute CPU address of a DMC sample for the given address register.
pub(crate) fn dmc_sample_address(address_reg: u8) -> u16 {
    0xC000 + address_reg as u16 * 64
}
