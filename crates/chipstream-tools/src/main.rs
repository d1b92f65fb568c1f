use std::path::PathBuf;

use anyhow::Result;
use chipstream::{PlayMode, PlayerConfig};
use clap::{Parser, Subcommand, ValueEnum};

mod dump;
mod info;
mod library;
mod play;
mod sink;

use library::load_bytes;

/// chipstream command line player
#[derive(Parser)]
#[command(
    name = "chipstream",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Loop,
    Shuffle,
    InOrder,
}

impl From<Mode> for PlayMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Loop => PlayMode::Loop,
            Mode::Shuffle => PlayMode::Shuffle,
            Mode::InOrder => PlayMode::InOrder,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show header and Gd3 summary for a VGM file (.vgm or .vgz)
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Interpret a VGM file without timing and print its register writes
    Dump {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Number of loops to run through
        #[arg(long, default_value_t = 1)]
        loops: u32,
    },
    /// Play every track in a directory in real time.
    ///
    /// Commands on stdin: + next, - previous, * random, / shuffle, . loop,
    /// > in order, ? metadata, r:NAME request, q quit.
    Play {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = Mode::Shuffle)]
        mode: Mode,
        /// Loops before the play mode moves on
        #[arg(long, default_value_t = chipstream::player::DEFAULT_MAX_LOOPS)]
        max_loops: u32,
        /// Command buffer capacity in bytes
        #[arg(long, default_value_t = chipstream::stream::DEFAULT_BUFFER_CAPACITY)]
        buffer: usize,
        /// Loop cache size in bytes
        #[arg(long, default_value_t = chipstream::stream::DEFAULT_LOOP_CACHE_LEN)]
        loop_cache: usize,
        /// Tick rate in Hz
        #[arg(long, default_value_t = chipstream::timing::DEFAULT_SAMPLE_RATE)]
        rate: u32,
        /// Start with the track of this file name
        #[arg(long)]
        request: Option<String>,
        /// Print every register write
        #[arg(long)]
        echo: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let bytes = load_bytes(&file)?;
            info::info(&file, bytes)?;
        }
        Commands::Dump { file, loops } => {
            let bytes = load_bytes(&file)?;
            dump::dump(&file, bytes, loops)?;
        }
        Commands::Play {
            dir,
            mode,
            max_loops,
            buffer,
            loop_cache,
            rate,
            request,
            echo,
        } => {
            let config = PlayerConfig {
                buffer_capacity: buffer,
                loop_cache_len: loop_cache,
                max_loops,
                play_mode: mode.into(),
                sample_rate: rate,
            };
            play::run(dir, config, request, echo)?;
        }
    }

    Ok(())
}
