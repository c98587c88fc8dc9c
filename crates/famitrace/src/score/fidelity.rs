//! Lossy fidelity reductions.
use super::{Fidelity, PitchedVoice, Score};

/// Velocity steps kept by the quantized and blended fidelities.
pub const VELOCITY_LEVELS: [u8; 5] = [0, 4, 8, 12, 15];

/// Nearest entry of `VELOCITY_LEVELS`; ties go to the louder level.
pub fn level_velocity(velocity: f64) -> f64 {
    let mut best = VELOCITY_LEVELS[0] as f64;
    for level in VELOCITY_LEVELS.map(f64::from) {
        if (velocity - level).abs() <= (velocity - best).abs() {
            best = level;
        }
    }
    best
}

fn map_voices(score: &Score, fidelity: Fidelity, f: impl Fn(&PitchedVoice) -> PitchedVoice) -> Score {
    let mut out = score.clone();
    out.fidelity = fidelity;
    for frame in &mut out.frames {
        for voice in frame.voices.iter_mut().flatten() {
            *voice = f(voice);
        }
    }
    out
}

/// Round pitch to the nearest semitone and velocity to `VELOCITY_LEVELS`.
///
/// One-directional: the fractional part is gone. Applying it to a
/// quantized score returns the same score.
pub fn reduce_to_quantized(score: &Score) -> Score {
    map_voices(score, Fidelity::Quantized, |v| PitchedVoice {
        pitch: v.pitch.round(),
        velocity: level_velocity(v.velocity),
        ..*v
    })
}

/// Keep continuous pitch, level velocity only.
///
/// A quantized input stays quantized since its pitch is already rounded.
pub fn expand_to_blended(score: &Score) -> Score {
    let fidelity = match score.fidelity {
        Fidelity::Quantized => Fidelity::Quantized,
        _ => Fidelity::Blended,
    };
    map_voices(score, fidelity, |v| PitchedVoice {
        velocity: level_velocity(v.velocity),
        ..*v
    })
}
