mod common;

use std::io::Cursor;

use approx::assert_relative_eq;
use famitrace::chip::{Channel, NTSC_CLOCK, TICK_RATE, replay};
use famitrace::synth::{SAMPLE_RATE, SynthOptions, render, wav_bytes};
use famitrace::vgm::{self, ReduceOptions};

use common::{five_channel_log, pulse_note_log};

/// Fundamental frequency from rising crossings of the mean level.
fn fundamental(pcm: &[i16]) -> f64 {
    let mean = pcm.iter().map(|&s| s as f64).sum::<f64>() / pcm.len() as f64;
    let rising: Vec<usize> = pcm
        .windows(2)
        .enumerate()
        .filter(|(_, w)| (w[0] as f64) < mean && (w[1] as f64) >= mean)
        .map(|(i, _)| i + 1)
        .collect();
    assert!(rising.len() >= 2, "no periodic signal");
    let span = (rising[rising.len() - 1] - rising[0]) as f64;
    (rising.len() - 1) as f64 * SAMPLE_RATE as f64 / span
}

#[test]
fn pulse_note_renders_at_its_period() {
    let pcm = render(&replay(&pulse_note_log(1000)), &SynthOptions::default());
    assert_eq!(pcm.len(), 1000);
    assert_relative_eq!(pcm.len() as f64 / TICK_RATE as f64, 1000.0 / 44_100.0);
    let expected = NTSC_CLOCK as f64 / (16.0 * 254.0);
    assert_relative_eq!(fundamental(&pcm), expected, max_relative = 0.02);
}

#[test]
fn dc_blocked_render_keeps_length_and_pitch() {
    let options = SynthOptions { dc_block: true };
    let pcm = render(&replay(&pulse_note_log(1000)), &options);
    assert_eq!(pcm.len(), 1000);
    assert!(pcm.iter().any(|&s| s < 0));
    let expected = NTSC_CLOCK as f64 / (16.0 * 254.0);
    assert_relative_eq!(fundamental(&pcm[200..]), expected, max_relative = 0.02);
}

#[test]
fn suppression_silences_only_the_dropped_passage() {
    let log = five_channel_log();
    let reduced =
        vgm::suppress_channels(&log, &ReduceOptions::suppressing([Channel::Noise, Channel::Dmc]))
            .unwrap();
    let options = SynthOptions::default();
    let full = render(&replay(&log), &options);
    let quiet = render(&replay(&reduced), &options);
    assert_eq!(full.len(), 4000);
    assert_eq!(quiet.len(), 4000);
    assert_eq!(full[..2000], quiet[..2000]);
    assert!(quiet[2000..].iter().all(|&s| s == 0));
    assert!(full[2000..].iter().any(|&s| s != 0));
}

#[test]
fn wav_holds_the_rendered_samples() {
    let pcm = render(&replay(&pulse_note_log(441)), &SynthOptions::default());
    let bytes = wav_bytes(&pcm).unwrap();
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!((spec.channels, spec.sample_rate, spec.bits_per_sample), (1, 44_100, 16));
    let back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(back, pcm);
}
