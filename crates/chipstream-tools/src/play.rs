//! `play` subcommand: stream a directory of tracks against the console
//! sink, driven by a real-time ticker and steered from stdin.
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context, Result};
use chipstream::{Gd3, PlayMode, Player, PlayerConfig, PlayerError, Strategy, Ticker, TrackLibrary};
use log::{info, warn};
use unicode_width::UnicodeWidthStr;

use crate::library::DirLibrary;
use crate::sink::ConsoleSink;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(Strategy),
    Mode(PlayMode),
    Metadata,
    Quit,
}

/// Map a stdin line to a command: `+` next, `-` previous, `*` random,
/// `/` shuffle, `.` loop, `>` in order, `?` metadata, `r:NAME` request,
/// `q` quit.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Some(name) = line.strip_prefix("r:") {
        return Some(Command::Select(Strategy::Request(name.trim().to_string())));
    }
    let command = match line {
        "+" => Command::Select(Strategy::Next),
        "-" => Command::Select(Strategy::Previous),
        "*" => Command::Select(Strategy::Random),
        "/" => Command::Mode(PlayMode::Shuffle),
        "." => Command::Mode(PlayMode::Loop),
        ">" => Command::Mode(PlayMode::InOrder),
        "?" => Command::Metadata,
        "q" | "quit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn spawn_stdin_reader() -> io::Result<Receiver<Command>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("chipstream-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    None => warn!("unknown command: {}", line.trim()),
                }
            }
        })?;
    Ok(rx)
}

/// Pad to a display width, counting fullwidth characters as two columns.
fn pad_to_width(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

fn print_metadata(index: usize, name: &str, gd3: &Gd3) {
    println!("[{index}] {name}");
    for (label, value) in [
        ("Track", &gd3.track_name),
        ("Game", &gd3.game_name),
        ("System", &gd3.system_name),
        ("Author", &gd3.author),
        ("Released", &gd3.release_date),
    ] {
        println!("  {} {value}", pad_to_width(label, 9));
    }
}

fn now_playing(player: &Player<DirLibrary, ConsoleSink>) {
    if let Some(gd3) = player.current_metadata() {
        print_metadata(
            player.current_index(),
            player.current_name().unwrap_or(""),
            gd3,
        );
    }
}

pub fn run(dir: PathBuf, config: PlayerConfig, request: Option<String>, echo: bool) -> Result<()> {
    let library = DirLibrary::open(&dir)?;
    info!("{} tracks in {}", library.len(), library.root().display());

    let rate = config.sample_rate;
    let mut player = Player::new(library, ConsoleSink::new(echo), config)
        .with_context(|| format!("no playable track in {}", dir.display()))?;
    player.on_command_error(|err| warn!("{err}"));
    if let Some(name) = request {
        match player.select_track(Strategy::Request(name)) {
            Err(PlayerError::NotFound(name)) => warn!("track not found: {name}"),
            other => {
                other?;
            }
        }
    }

    let ticker = Ticker::spawn(player.tick_state(), rate)?;
    let commands = spawn_stdin_reader()?;
    let tick = player.tick_state();
    let mut playing = player.current_index();
    now_playing(&player);

    loop {
        match commands.try_recv() {
            Ok(Command::Quit) => break,
            Ok(Command::Select(strategy)) => match player.select_track(strategy) {
                Err(PlayerError::NotFound(name)) => warn!("track not found: {name}"),
                other => {
                    other?;
                }
            },
            Ok(Command::Mode(mode)) => {
                info!("play mode {mode:?}");
                player.set_play_mode(mode);
            }
            Ok(Command::Metadata) => now_playing(&player),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => {}
        }

        player.poll()?;
        if player.current_index() != playing {
            playing = player.current_index();
            now_playing(&player);
        }
        if tick.wait_samples() > 0 {
            thread::yield_now();
        }
    }

    ticker.stop();
    info!(
        "{} register writes, last clock {} Hz",
        player.sink().writes(),
        player.sink().clock()
    );
    Ok(())
}
