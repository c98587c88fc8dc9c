use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};

use famitrace::chip::{Channel, TICK_RATE, replay};
use famitrace::disasm::segment;
use famitrace::vgm::{self, Command, EventLog};

use crate::input::read_bytes;

fn seconds(ticks: u64) -> String {
    format!("{} ({:.3} s @ {TICK_RATE}Hz)", ticks, ticks as f64 / TICK_RATE as f64)
}

/// Stable key/value summary of an event log.
fn summarize(log: &EventLog) -> Vec<(String, String)> {
    let header = &log.header;
    let mut writes = [0usize; 5];
    let mut other_writes = 0usize;
    let mut unsupported = 0usize;
    let mut ram_bytes = 0usize;
    let mut ram_blocks = 0usize;
    for command in log {
        match command {
            Command::Write { register, .. } => match register.channel() {
                Some(channel) => writes[channel.index()] += 1,
                None => other_writes += 1,
            },
            Command::Unsupported { .. } => unsupported += 1,
            Command::RamWrite(block) => {
                ram_blocks += 1;
                ram_bytes += block.data.len();
            }
            Command::Wait(_) | Command::End => {}
        }
    }

    let mut rows: Vec<(String, String)> = vec![
        ("VGM version".into(), format!("0x{:08X}", header.version)),
        ("clock".into(), format!("{} Hz", log.clock())),
        ("data_start".into(), format!("0x{:08X}", header.data_start)),
        ("total_samples".into(), seconds(log.total_ticks())),
        (
            "loop".into(),
            match log.loop_tick() {
                Some(tick) => format!("tick {tick}, {} looped", seconds(log.total_ticks() - tick)),
                None => "(none)".into(),
            },
        ),
        ("commands".into(), format!("total={} unsupported={unsupported}", log.commands().len())),
        ("data_blocks".into(), format!("count={ram_blocks} total_bytes={ram_bytes}")),
    ];
    for channel in Channel::ALL {
        rows.push((format!("writes.{channel}"), writes[channel.index()].to_string()));
    }
    rows.push(("writes.control".into(), other_writes.to_string()));
    rows
}

fn print_rows(rows: &[(String, String)]) {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    println!("{table}");
}

/// Print a summary of an event log and the notes found in it.
pub fn info(path: &Path) -> Result<()> {
    let bytes = read_bytes(path)?;
    let log = vgm::decode(&bytes).with_context(|| format!("\"{}\"", path.display()))?;
    let mut rows = summarize(&log);
    let notes = segment(&replay(&log));
    for channel in Channel::ALL {
        rows.push((
            format!("notes.{channel}"),
            notes.channel(channel).count().to_string(),
        ));
    }
    print_rows(&rows);
    Ok(())
}

/// Decode, encode and decode again; the round trip passes when both logs
/// replay to the same register states.
pub fn test_roundtrip(path: &Path, diag: bool) -> Result<bool> {
    let bytes = read_bytes(path)?;
    let original = vgm::decode(&bytes).with_context(|| format!("\"{}\": parse error", path.display()))?;
    let rebuilt_bytes = vgm::encode(&original);
    let rebuilt = vgm::decode(&rebuilt_bytes)
        .with_context(|| format!("\"{}\": re-parse of encoded log failed", path.display()))?;

    let (a, b) = (replay(&original), replay(&rebuilt));
    let mismatch = a.states.iter().zip(&b.states).position(|(x, y)| x != y);
    let passed = a.len() == b.len() && mismatch.is_none();
    if passed {
        println!(
            "\"{}\": roundtrip: OK ({} ticks, {} -> {} bytes)",
            path.display(),
            a.len(),
            bytes.len(),
            rebuilt_bytes.len()
        );
    } else {
        println!(
            "\"{}\": roundtrip: MISMATCH (ticks {} vs {}, first differing tick {:?})",
            path.display(),
            a.len(),
            b.len(),
            mismatch
        );
    }

    if diag {
        let original_rows = summarize(&original);
        let rebuilt_rows = summarize(&rebuilt);
        let mut side = Table::new();
        side.load_preset(NOTHING);
        side.set_content_arrangement(ContentArrangement::Dynamic);
        side.set_header(vec![
            Cell::new("Field"),
            Cell::new("Original"),
            Cell::new("Rebuilt"),
        ]);
        for ((key, ov), (_, rv)) in original_rows.iter().zip(&rebuilt_rows) {
            side.add_row(vec![Cell::new(key), Cell::new(ov), Cell::new(rv)]);
        }
        println!("{side}");
    }
    Ok(passed)
}
