use std::fs::File;
use std::io::{Read, stdin};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use flate2::read::GzDecoder;

use famitrace::chip::{Timeline, replay};
use famitrace::disasm::{self, NoteStream};
use famitrace::score::{self, Score};
use famitrace::vgm::{self, EventLog};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const VGM_MAGIC: &[u8] = b"Vgm ";

/// Read bytes from a path or stdin ('-'), gunzipping `.vgz` files and
/// gzip-compressed stdin.
pub fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut raw = Vec::new();
    if path == Path::new("-") {
        stdin()
            .read_to_end(&mut raw)
            .context("failed to read from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?
            .read_to_end(&mut raw)
            .context("failed to read input file")?;
    }

    let is_vgz = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vgz"));
    if is_vgz || raw.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(&raw[..])
            .read_to_end(&mut out)
            .context("failed to decompress gzip input")?;
        return Ok(out);
    }
    Ok(raw)
}

/// Any representation the tools accept as input.
pub enum Input {
    Log(EventLog),
    Notes(NoteStream),
    Score(Score),
}

impl Input {
    /// Binary VGM, or one of the text forms told apart by their header
    /// keyword.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = read_bytes(path)?;
        if bytes.starts_with(VGM_MAGIC) {
            return Ok(Input::Log(vgm::decode(&bytes)?));
        }
        let text = String::from_utf8(bytes).context("input is neither VGM nor UTF-8 text")?;
        let keyword = text
            .lines()
            .map(|l| l.split('#').next().unwrap_or("").trim())
            .find(|l| !l.is_empty())
            .and_then(|l| l.split_whitespace().next())
            .unwrap_or("");
        Ok(match keyword {
            "log" => Input::Log(vgm::text::from_text(&text)?),
            "notes" => Input::Notes(disasm::text::from_text(&text)?),
            "score" => Input::Score(score::text::from_text(&text)?),
            other => bail!("unrecognised input header {other:?}"),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Input::Log(_) => "event log",
            Input::Notes(_) => "note stream",
            Input::Score(_) => "score",
        }
    }

    /// Lower the input to an event log through the inverse chain.
    pub fn into_log(self) -> EventLog {
        match self {
            Input::Log(log) => log,
            Input::Notes(notes) => disasm::emit_log(&notes),
            Input::Score(score) => disasm::emit_log(&score::to_note_events(&score)),
        }
    }

    pub fn into_timeline(self) -> Timeline {
        match self {
            Input::Log(log) => replay(&log),
            Input::Notes(notes) => disasm::emit(&notes),
            Input::Score(score) => disasm::emit(&score::to_note_events(&score)),
        }
    }

    /// Raise the input to a note stream. Scores come back down through
    /// `to_note_events`.
    pub fn into_notes(self) -> NoteStream {
        match self {
            Input::Log(log) => disasm::segment(&replay(&log)),
            Input::Notes(notes) => notes,
            Input::Score(score) => score::to_note_events(&score),
        }
    }

    /// Raise the input to a score at `fps`; a score input is resampled
    /// when `fps` is slower than its own rate.
    pub fn into_score(self, fps: f64) -> famitrace::Result<Score> {
        match self {
            Input::Score(score) if score.rate.fps() == fps => Ok(score),
            Input::Score(score) => score::resample(&score, fps),
            other => score::quantize(&other.into_notes(), fps),
        }
    }
}

/// Output path for `input`: its name with known extensions replaced by
/// `extension`, placed in `out_dir` or next to the input.
pub fn output_path(input: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("stdin");
    let mut stem = name;
    for suffix in [".vgz", ".vgm", ".txt", ".log", ".notes", ".score"] {
        if let Some(rest) = stem.strip_suffix(suffix) {
            stem = rest;
        }
    }
    let file = format!("{stem}.{extension}");
    match out_dir {
        Some(dir) => dir.join(file),
        None => input.with_file_name(file),
    }
}
