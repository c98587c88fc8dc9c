//! Frame-rate reduction.
use super::{Frame, FrameRate, PitchedVoice, Score};
use crate::error::{Error, Result};

/// Identity of a voice for majority counting; the onset flag is ignored.
fn key(voice: Option<&PitchedVoice>) -> Option<(u64, u64, u8)> {
    voice.map(|v| (v.pitch.to_bits(), v.velocity.to_bits(), v.timbre))
}

/// Most frequent voice of a group without onsets. Ties go to the voice
/// seen last.
fn majority<'a>(voices: impl Iterator<Item = Option<&'a PitchedVoice>>) -> Option<PitchedVoice> {
    let mut counts: Vec<(Option<(u64, u64, u8)>, usize, Option<&PitchedVoice>, usize)> = Vec::new();
    for (position, voice) in voices.enumerate() {
        let k = key(voice);
        match counts.iter_mut().find(|(other, ..)| *other == k) {
            Some(entry) => {
                entry.1 += 1;
                entry.3 = position;
            }
            None => counts.push((k, 1, voice, position)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|&(_, count, _, last)| (count, last))
        .and_then(|(_, _, voice, _)| voice.copied())
        .map(|v| PitchedVoice { onset: false, ..v })
}

/// Merge frames onto a slower grid of `fps` frames per second.
///
/// Every target frame takes the group of source frames starting inside it.
/// Per channel, a group holding onsets shows its most recent onset;
/// otherwise it shows the voice most of its frames agree on. Onsets are
/// never created, only kept or dropped. The DMC keeps the last trigger.
pub fn resample(score: &Score, fps: f64) -> Result<Score> {
    let rate = FrameRate::new(fps)?;
    let source = score.rate.fps();
    if fps > source {
        return Err(Error::range(
            "resample rate",
            format!("{fps} exceeds the source rate {source}"),
        ));
    }

    let count = rate.frame_count(score.length_ticks);
    let mut groups: Vec<Vec<&Frame>> = vec![Vec::new(); count];
    for (index, frame) in score.frames.iter().enumerate() {
        let target = (index as f64 * fps / source + 1e-9).floor() as usize;
        if let Some(group) = groups.get_mut(target) {
            group.push(frame);
        }
    }

    let frames = groups
        .iter()
        .map(|group| {
            let mut frame = Frame::default();
            for (slot, voice) in frame.voices.iter_mut().enumerate() {
                let onset = group
                    .iter()
                    .rev()
                    .filter_map(|f| f.voices[slot].as_ref())
                    .find(|v| v.onset);
                *voice = match onset {
                    Some(v) => Some(*v),
                    None => majority(group.iter().map(|f| f.voices[slot].as_ref())),
                };
            }
            frame.dmc = group.iter().rev().find_map(|f| f.dmc);
            frame
        })
        .collect();

    tracing::trace!(from = source, to = fps, frames = count, "resampled score");
    Ok(Score {
        rate,
        frames,
        ..score.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Channel;

    fn voice(pitch: f64, onset: bool) -> Option<PitchedVoice> {
        Some(PitchedVoice {
            pitch,
            velocity: 15.0,
            timbre: 0,
            onset,
        })
    }

    fn score(voices: &[Option<PitchedVoice>]) -> Score {
        let mut score = Score::silent(FrameRate::new(60.0).unwrap(), voices.len() as u64 * 735);
        for (frame, v) in score.frames.iter_mut().zip(voices) {
            frame.voices[0] = *v;
        }
        score
    }

    #[test]
    fn faster_rate_is_rejected() {
        let s = score(&[None]);
        assert!(matches!(resample(&s, 120.0), Err(Error::RangeViolation { .. })));
        assert!(matches!(resample(&s, 0.0), Err(Error::RangeViolation { .. })));
    }

    #[test]
    fn group_keeps_latest_onset() {
        let s = score(&[voice(60.0, true), voice(62.0, true), voice(62.0, false), None]);
        let r = resample(&s, 30.0).unwrap();
        assert_eq!(r.frames.len(), 2);
        assert_eq!(r.frames[0].voice(Channel::Pulse1), voice(62.0, true).as_ref());
        // No onset in the second group: majority with a tie, latest wins.
        assert_eq!(r.frames[1].voice(Channel::Pulse1), None);
    }

    #[test]
    fn majority_voice_without_onsets() {
        let s = score(&[
            voice(60.0, true),
            voice(60.0, false),
            voice(60.0, false),
            voice(60.0, false),
            None,
            voice(60.0, false),
        ]);
        let r = resample(&s, 20.0).unwrap();
        assert_eq!(r.frames.len(), 2);
        assert!(r.frames[0].voice(Channel::Pulse1).unwrap().onset);
        let second = r.frames[1].voice(Channel::Pulse1).unwrap();
        assert!(!second.onset);
        assert_eq!(second.pitch, 60.0);
    }
}
