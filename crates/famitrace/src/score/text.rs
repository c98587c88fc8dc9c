//! Text transcription of a score.
//!
//! ```text
//! score clock=1789773 rate=60 fidelity=expressive length=4410
//! ram c000 55aa
//! 0 p1 57.0312 15 2 *
//! 1 p1 57.0312 12 2
//! 0 dmc c000 17 15 8
//! ```
//!
//! One line per non-silent channel per frame. Pitched channels give
//! `<frame> <ch> <pitch> <velocity> <timbre>` with a trailing `*` on onset
//! frames; DMC triggers give `<frame> dmc <address> <length> <control>
//! <level>`. Silent frames are omitted.
use std::fmt::Write as _;

use super::{Fidelity, Frame, FrameRate, PitchedVoice, SampleTrigger, Score};
use crate::chip::{Channel, RamBlock, SampleMemory};
use crate::error::{Error, Result};
use crate::textfmt::{self, Line, hex_bytes, parse_hex_bytes};

pub fn to_text(score: &Score) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "score clock={} rate={} fidelity={} length={}",
        score.clock, score.rate, score.fidelity, score.length_ticks
    );
    for block in score.samples.blocks() {
        let _ = writeln!(out, "ram {:04x} {}", block.address, hex_bytes(&block.data));
    }
    for (index, frame) in score.frames.iter().enumerate() {
        for channel in Channel::PITCHED {
            if let Some(v) = frame.voice(channel) {
                let _ = write!(out, "{index} {channel} {} {} {}", v.pitch, v.velocity, v.timbre);
                out.push_str(if v.onset { " *\n" } else { "\n" });
            }
        }
        if let Some(t) = frame.dmc {
            let _ = writeln!(
                out,
                "{index} dmc {:04x} {} {} {}",
                t.address, t.length, t.control, t.level
            );
        }
    }
    out
}

fn parse_voice(line: &Line<'_>, channel: Channel) -> Result<PitchedVoice> {
    let onset = match line.len() {
        5 => false,
        6 => {
            let mark = line.field(5)?;
            if mark.text != "*" {
                return Err(line.error_at(mark, "expected onset mark \"*\""));
            }
            true
        }
        _ => {
            line.expect_len(5)?;
            false
        }
    };
    let pitch: f64 = line.parse(2, "pitch")?;
    let pitch_ok = match channel {
        Channel::Noise => (0.0..=15.0).contains(&pitch),
        _ => pitch.is_finite(),
    };
    if !pitch_ok {
        return Err(line.error_at(line.field(2)?, format!("{channel} pitch {pitch} out of range")));
    }
    let velocity: f64 = line.parse(3, "velocity")?;
    if !(0.0..=15.0).contains(&velocity) {
        return Err(line.error_at(line.field(3)?, "velocity outside 0-15"));
    }
    let timbre: u8 = line.parse(4, "timbre")?;
    let limit = match channel {
        Channel::Pulse1 | Channel::Pulse2 => 3,
        Channel::Noise => 1,
        _ => 0,
    };
    if timbre > limit {
        return Err(line.error_at(line.field(4)?, format!("timbre above {limit}")));
    }
    Ok(PitchedVoice {
        pitch,
        velocity,
        timbre,
        onset,
    })
}

fn parse_trigger(line: &Line<'_>) -> Result<SampleTrigger> {
    line.expect_len(6)?;
    let control: u8 = line.parse(4, "control")?;
    if control & !0x4F != 0 {
        return Err(line.error_at(line.field(4)?, "control uses bits outside 0x4F"));
    }
    let level: u8 = line.parse(5, "level")?;
    if level > 15 {
        return Err(line.error_at(line.field(5)?, "level above 15"));
    }
    Ok(SampleTrigger {
        address: line.parse_hex_as(2, "address")?,
        length: line.parse(3, "length")?,
        control,
        level,
    })
}

pub fn from_text(text: &str) -> Result<Score> {
    let mut lines = textfmt::lines(text);
    let header = lines
        .next()
        .ok_or_else(|| Error::syntax(1, 1, "empty transcription"))?;
    if header.keyword() != "score" {
        return Err(header.error_at(header.field(0)?, "expected \"score\" header"));
    }
    header.expect_len(5)?;
    let clock = header.parse_clock(1)?;
    let rate_field = header.field(2)?;
    let fps: f64 = header.parse_keyed(2, "rate")?;
    let rate = FrameRate::new(fps).map_err(|e| header.error_at(rate_field, e.to_string()))?;
    let fidelity: Fidelity = header.parse_keyed(3, "fidelity")?;
    let length_field = header.field(4)?;
    let length = header.parse_length(4)?;

    let mut samples = SampleMemory::new();
    let count = rate.frame_count(length);
    let mut frames: Vec<Frame> = Vec::new();
    frames
        .try_reserve_exact(count)
        .map_err(|_| header.error_at(length_field, format!("{count} frames do not fit in memory")))?;
    frames.resize(count, Frame::default());

    for line in lines {
        if line.keyword() == "ram" {
            line.expect_len(3)?;
            samples.push(RamBlock {
                address: line.parse_hex_as(1, "address")?,
                data: parse_hex_bytes(&line, 2)?,
            });
            continue;
        }
        let frame_field = line.field(0)?;
        let index: usize = line.parse(0, "frame")?;
        let count = frames.len();
        let frame = frames.get_mut(index).ok_or_else(|| {
            line.error_at(frame_field, format!("frame {index} beyond {count} frames"))
        })?;
        let channel_field = line.field(1)?;
        let channel: Channel = channel_field
            .text
            .parse()
            .map_err(|reason: String| line.error_at(channel_field, reason))?;
        let duplicate = match channel {
            Channel::Dmc => frame.dmc.replace(parse_trigger(&line)?).is_some(),
            _ => frame.voices[channel.index()]
                .replace(parse_voice(&line, channel)?)
                .is_some(),
        };
        if duplicate {
            return Err(line.error_at(channel_field, format!("second {channel} entry for frame {index}")));
        }
    }

    Ok(Score {
        rate,
        fidelity,
        clock,
        length_ticks: length,
        frames,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "score clock=1789773 rate=60 fidelity=blended length=2205
ram c000 55aa
0 p1 57.25 15 2 *
1 p1 57.25 12 2
0 no 4 8 1 *
2 dmc c000 17 15 8
";

    #[test]
    fn transcription_round_trips() {
        let score = from_text(SAMPLE).unwrap();
        assert_eq!(score.frames.len(), 3);
        assert_eq!(score.fidelity, Fidelity::Blended);
        let p1 = score.frames[1].voice(Channel::Pulse1).unwrap();
        assert_eq!((p1.pitch, p1.velocity, p1.onset), (57.25, 12.0, false));
        assert_eq!(score.frames[2].dmc.unwrap().length, 17);
        assert!(score.frames[2].voice(Channel::Pulse1).is_none());
        assert_eq!(from_text(&to_text(&score)).unwrap(), score);
    }

    #[test]
    fn frame_beyond_length_is_rejected() {
        let text = "score clock=1789773 rate=60 fidelity=expressive length=735\n1 p1 60 15 0\n";
        assert!(matches!(
            from_text(text),
            Err(Error::Syntax { line: 2, column: 1, .. })
        ));
    }

    #[test]
    fn duplicate_entry_is_rejected() {
        let text = "score clock=1789773 rate=60 fidelity=expressive length=735\n0 tr 60 15 0\n0 tr 61 15 0\n";
        assert!(matches!(
            from_text(text),
            Err(Error::Syntax { line: 3, column: 3, .. })
        ));
    }

    #[test]
    fn bad_onset_mark_points_at_field() {
        let text = "score clock=1789773 rate=60 fidelity=expressive length=735\n0 p2 60 15 0 x\n";
        assert!(matches!(
            from_text(text),
            Err(Error::Syntax { line: 2, column: 14, .. })
        ));
    }

    #[test]
    fn oversized_or_clockless_headers_are_rejected() {
        let huge = "score clock=1789773 rate=60 fidelity=expressive length=18446744073709551615\n";
        assert!(matches!(
            from_text(huge),
            Err(Error::Syntax { line: 1, column: 49, .. })
        ));
        let clockless = "score clock=0 rate=60 fidelity=expressive length=735\n0 p1 60 15 0\n";
        assert!(matches!(
            from_text(clockless),
            Err(Error::Syntax { line: 1, column: 7, .. })
        ));
    }
}
