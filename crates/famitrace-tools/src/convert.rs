use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};

use famitrace::chip::Channel;
use famitrace::disasm;
use famitrace::interchange::{Event, Interchange};
use famitrace::score::{self, Fidelity, Score};
use famitrace::synth::{self, SynthOptions};
use famitrace::vgm::{self, EventLog, ReduceOptions, TruncateOptions};

use crate::input::{Input, output_path};

/// Target of a per-track conversion.
#[derive(Debug, Clone)]
pub enum Conversion {
    Simplify { drop: Vec<Channel> },
    Shorten { start: u64, length: u64 },
    Disasm,
    Notes,
    Score { fps: f64, fidelity: Fidelity },
    Vgm,
    Wav { dc_block: bool },
}

impl Conversion {
    fn extension(&self) -> &'static str {
        match self {
            Conversion::Simplify { .. } => "simple.vgm",
            Conversion::Shorten { .. } => "short.vgm",
            Conversion::Disasm => "log.txt",
            Conversion::Notes => "notes.txt",
            Conversion::Score { .. } => "score.txt",
            Conversion::Vgm => "vgm",
            Conversion::Wav { .. } => "wav",
        }
    }
}

fn require_log(input: Input, what: &str) -> Result<EventLog> {
    match input {
        Input::Log(log) => Ok(log),
        other => bail!("{what} needs an event log, got a {}", other.kind()),
    }
}

fn build_score(input: Input, fps: f64, fidelity: Fidelity) -> famitrace::Result<Score> {
    let score = input.into_score(fps)?;
    Ok(match fidelity {
        Fidelity::Expressive => score,
        Fidelity::Quantized => score::reduce_to_quantized(&score),
        Fidelity::Blended => score::expand_to_blended(&score),
    })
}

/// Convert one track and return the written path.
fn convert_one(path: &Path, out_dir: Option<&Path>, conversion: &Conversion) -> Result<PathBuf> {
    let output = output_path(path, out_dir, conversion.extension());
    if output == path {
        bail!("output would overwrite the input");
    }
    let input = Input::load(path)?;
    tracing::debug!(input = %path.display(), kind = input.kind(), ?conversion, "converting");

    match conversion {
        Conversion::Simplify { drop } => {
            let log = require_log(input, "simplify")?;
            let reduced = vgm::suppress_channels(&log, &ReduceOptions::suppressing(drop.iter().copied()))?;
            std::fs::write(&output, vgm::encode(&reduced))?;
        }
        Conversion::Shorten { start, length } => {
            let log = require_log(input, "shorten")?;
            let options = TruncateOptions {
                start: *start,
                length: *length,
            };
            std::fs::write(&output, vgm::encode(&vgm::truncate(&log, &options)?))?;
        }
        Conversion::Disasm => {
            std::fs::write(&output, vgm::text::to_text(&input.into_log()))?;
        }
        Conversion::Notes => {
            std::fs::write(&output, disasm::text::to_text(&input.into_notes()))?;
        }
        Conversion::Score { fps, fidelity } => {
            let score = build_score(input, *fps, *fidelity)?;
            std::fs::write(&output, score::text::to_text(&score))?;
        }
        Conversion::Vgm => {
            std::fs::write(&output, vgm::encode(&input.into_log()))?;
        }
        Conversion::Wav { dc_block } => {
            let pcm = synth::render(&input.into_timeline(), &SynthOptions { dc_block: *dc_block });
            synth::write_wav(&output, &pcm)?;
        }
    }
    Ok(output)
}

/// Convert every file, isolating failures per track. Fails at the end if
/// any track failed.
pub fn convert_all(files: &[PathBuf], out_dir: Option<&Path>, conversion: &Conversion) -> Result<()> {
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }
    let mut failed = 0usize;
    for file in files {
        match convert_one(file, out_dir, conversion)
            .with_context(|| format!("\"{}\"", file.display()))
        {
            Ok(output) => println!("\"{}\" -> \"{}\"", file.display(), output.display()),
            Err(err) => {
                eprintln!("{err:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} tracks failed", files.len());
    }
    Ok(())
}

fn describe(event: &Event) -> String {
    match event {
        Event::NoteOn { key, velocity } => format!("note on  key={key} vel={velocity}"),
        Event::NoteOff { key } => format!("note off key={key}"),
        Event::Expression(v) => format!("expression {v}"),
        Event::Program(v) => format!("program {v}"),
        Event::PitchBend(v) => format!("pitch bend {v}"),
    }
}

/// Print the interchange tracks of one input.
pub fn events(path: &Path, fps: f64) -> Result<()> {
    let input = Input::load(path)?;
    let score = input
        .into_score(fps)
        .with_context(|| format!("\"{}\"", path.display()))?;
    let interchange = Interchange::from_score(&score)?;

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Frame"), Cell::new("Track"), Cell::new("Event")]);
    let mut rows: Vec<(usize, Channel, &Event)> = interchange
        .tracks
        .iter()
        .flat_map(|t| t.events.iter().map(move |e| (e.frame, t.channel, &e.event)))
        .collect();
    rows.sort_by_key(|(frame, channel, _)| (*frame, channel.index()));
    for (frame, channel, event) in rows {
        table.add_row(vec![
            Cell::new(frame),
            Cell::new(channel),
            Cell::new(describe(event)),
        ]);
    }
    println!("{table}");
    println!(
        "{} frames at {} fps, {} DMC triggers",
        score.frames.len(),
        interchange.frame_rate,
        interchange.triggers.len()
    );
    Ok(())
}
