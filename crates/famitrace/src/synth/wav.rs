//! WAV output for rendered PCM.
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use crate::error::Result;

/// Output sample rate; one sample per tick.
pub const SAMPLE_RATE: u32 = crate::chip::TICK_RATE;

fn spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_samples<W: Write + Seek>(writer: W, samples: &[i16]) -> Result<()> {
    let mut writer = hound::WavWriter::new(writer, spec())?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write 16-bit mono PCM to a WAV file.
pub fn write_wav(path: impl AsRef<Path>, samples: &[i16]) -> Result<()> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_samples(file, samples)
}

/// Encode 16-bit mono PCM as WAV file bytes.
pub fn wav_bytes(samples: &[i16]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_samples(&mut cursor, samples)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_read_back_with_hound() {
        let samples = [0i16, 1000, -1000, i16::MAX];
        let bytes = wav_bytes(&samples).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec(), spec());
        let back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(back, samples);
    }
}
