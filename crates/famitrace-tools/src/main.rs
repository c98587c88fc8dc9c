use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use famitrace::chip::Channel;
use famitrace::score::Fidelity;

mod convert;
mod info;
mod input;
use convert::{Conversion, convert_all, events};

/// famitrace command line tools
#[derive(Parser)]
#[command(
    name = "famitrace",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show summary info for a VGM file (accepts .vgm or .vgz; use '-' for stdin)
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Run decode -> encode -> decode and compare the replayed register states
    Test {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// Print a field-by-field comparison
        #[arg(long = "diag")]
        diag: bool,
    },
    /// Remove channels from event logs (pulse 1 cannot be removed)
    Simplify {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// Channels to remove, e.g. `no,dmc`
        #[arg(long, value_delimiter = ',', required = true)]
        drop: Vec<Channel>,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Cut a window out of event logs
    Shorten {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// First tick of the window
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Window length in ticks (44,100 per second)
        #[arg(long)]
        length: u64,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Write the register-write listing of each input
    Disasm {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Write the note transcription of each input
    Notes {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Write the score transcription of each input
    Score {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// expressive, blended or quantized
        #[arg(long, default_value_t = Fidelity::Expressive)]
        fidelity: Fidelity,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Lower any input back to a VGM file
    Vgm {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Render any input to a 16-bit mono 44.1 kHz WAV file
    Wav {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// Remove the DC offset of the mixer
        #[arg(long)]
        dc_block: bool,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// List the note-interchange events of an input's score
    Events {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<bool> {
    let (files, out_dir, conversion) = match command {
        Commands::Info { file } => {
            info::info(&file)?;
            return Ok(true);
        }
        Commands::Test { files, diag } => {
            let mut passed = true;
            for file in &files {
                match info::test_roundtrip(file, diag) {
                    Ok(ok) => passed &= ok,
                    Err(err) => {
                        eprintln!("{err:#}");
                        passed = false;
                    }
                }
            }
            return Ok(passed);
        }
        Commands::Events { file, fps } => {
            events(&file, fps)?;
            return Ok(true);
        }
        Commands::Simplify { files, drop, out_dir } => {
            (files, out_dir, Conversion::Simplify { drop })
        }
        Commands::Shorten {
            files,
            start,
            length,
            out_dir,
        } => (files, out_dir, Conversion::Shorten { start, length }),
        Commands::Disasm { files, out_dir } => (files, out_dir, Conversion::Disasm),
        Commands::Notes { files, out_dir } => (files, out_dir, Conversion::Notes),
        Commands::Score {
            files,
            fps,
            fidelity,
            out_dir,
        } => (files, out_dir, Conversion::Score { fps, fidelity }),
        Commands::Vgm { files, out_dir } => (files, out_dir, Conversion::Vgm),
        Commands::Wav {
            files,
            dc_block,
            out_dir,
        } => (files, out_dir, Conversion::Wav { dc_block }),
    };
    convert_all(&files, out_dir.as_deref(), &conversion)?;
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
