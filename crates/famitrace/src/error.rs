//! Error taxonomy shared by every stage of the transcoder.

/// Error type for all famitrace operations.
///
/// `MalformedStream`, `RangeViolation` and `Syntax` are fatal for the track
/// being converted. `UnsupportedRegister` is recoverable: the emulator logs
/// it and skips the write, it only surfaces from explicit classification
/// helpers such as `Register::try_from`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Header or record corruption in an event log, or a bad loop offset.
    #[error("malformed stream at byte 0x{offset:X}: {reason}")]
    MalformedStream { offset: usize, reason: String },

    /// A write to a register id the APU does not define.
    #[error("unsupported register 0x{register:02X} at tick {tick}")]
    UnsupportedRegister { register: u8, tick: u64 },

    /// A configuration value outside its valid range (frame rate,
    /// truncation window, resample rate).
    #[error("{what} out of range: {detail}")]
    RangeViolation { what: &'static str, detail: String },

    /// A malformed line in a textual transcription.
    #[error("syntax error at line {line}, column {column}: {reason}")]
    Syntax {
        line: usize,
        column: usize,
        reason: String,
    },

    /// WAV encoding failure.
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    /// IO error from the filesystem.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn range(what: &'static str, detail: impl Into<String>) -> Self {
        Error::RangeViolation {
            what,
            detail: detail.into(),
        }
    }

    pub(crate) fn syntax(line: usize, column: usize, reason: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            column,
            reason: reason.into(),
        }
    }

    /// True for errors that abort the conversion of a track.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::UnsupportedRegister { .. })
    }
}

/// Result type for famitrace operations
pub type Result<T> = std::result::Result<T, Error>;
