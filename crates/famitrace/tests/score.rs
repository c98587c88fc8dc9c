mod common;

use famitrace::Error;
use famitrace::chip::{Channel, replay};
use famitrace::disasm::{NoteStream, segment};
use famitrace::score::{
    self, Fidelity, VELOCITY_LEVELS, expand_to_blended, quantize, reduce_to_quantized, resample,
    to_note_events,
};

use common::five_channel_log;

fn notes() -> NoteStream {
    segment(&replay(&five_channel_log()))
}

#[test]
fn quantize_recovers_onsets_within_a_frame() {
    let source = notes();
    let score = quantize(&source, 60.0).unwrap();
    assert_eq!(score.frames.len(), 6);
    let frame = score.rate.ticks_per_frame();
    let back = to_note_events(&score);
    assert_eq!(back.length, source.length);

    for note in &source.notes {
        let found = back.channel(note.channel).any(|n| {
            n.pitch == note.pitch
                && n.velocity == note.velocity
                && (n.onset as f64 - note.onset as f64).abs() <= frame
        });
        assert!(found, "no match for {note:?}");
    }
}

#[test]
fn mid_note_changes_reach_the_frames() {
    let score = quantize(&notes(), 60.0).unwrap();
    let velocities: Vec<f64> = score
        .frames
        .iter()
        .filter_map(|f| f.voice(Channel::Pulse1))
        .map(|v| v.velocity)
        .collect();
    // Frame 0 is the onset; later centres fall after the drop at tick 500.
    assert_eq!(velocities, vec![15.0, 8.0, 8.0]);
}

#[test]
fn resampling_introduces_no_onsets() {
    let source = quantize(&notes(), 60.0).unwrap();
    let half = resample(&source, 30.0).unwrap();
    assert_eq!(half.frames.len(), 3);
    for (index, frame) in half.frames.iter().enumerate() {
        for channel in Channel::PITCHED {
            if frame.voice(channel).is_some_and(|v| v.onset) {
                let group = &source.frames[index * 2..(index * 2 + 2).min(source.frames.len())];
                assert!(
                    group
                        .iter()
                        .any(|f| f.voice(channel).is_some_and(|v| v.onset)),
                    "{channel} onset in frame {index} has no source onset"
                );
            }
        }
    }
}

#[test]
fn resampling_to_a_faster_rate_fails() {
    let source = quantize(&notes(), 30.0).unwrap();
    assert!(matches!(
        resample(&source, 60.0),
        Err(Error::RangeViolation { .. })
    ));
}

#[test]
fn quantized_reduction_is_idempotent() {
    let score = quantize(&notes(), 50.0).unwrap();
    let once = reduce_to_quantized(&score);
    assert_eq!(once.fidelity, Fidelity::Quantized);
    assert_eq!(reduce_to_quantized(&once), once);
    for voice in once.frames.iter().flat_map(|f| f.voices.iter().flatten()) {
        assert_eq!(voice.pitch, voice.pitch.round());
        assert!(VELOCITY_LEVELS.map(f64::from).contains(&voice.velocity));
    }
}

#[test]
fn blended_expansion_keeps_pitch() {
    let score = quantize(&notes(), 60.0).unwrap();
    let blended = expand_to_blended(&score);
    assert_eq!(blended.fidelity, Fidelity::Blended);
    for (a, b) in score.frames.iter().zip(&blended.frames) {
        for (a, b) in a.voices.iter().zip(&b.voices) {
            assert_eq!(a.map(|v| v.pitch), b.map(|v| v.pitch));
        }
    }
}

#[test]
fn invalid_frame_rate_is_rejected() {
    for fps in [0.0, -60.0, f64::NAN] {
        assert!(matches!(
            quantize(&notes(), fps),
            Err(Error::RangeViolation { .. })
        ));
    }
}

#[test]
fn score_transcription_round_trips() {
    let score = quantize(&notes(), 60.0).unwrap();
    let text = score::text::to_text(&score);
    assert!(text.starts_with("score clock=1789773 rate=60 fidelity=expressive length=4000\n"));
    assert_eq!(score::text::from_text(&text).unwrap(), score);
}
