//! Playback driver.
//!
//! `Player` ties the pieces together: it owns the track library, the chip
//! sink, the selector and the current [`TrackSession`], and exposes the
//! command surface used by front ends (`select_track`, `set_play_mode`,
//! `current_metadata`). The main context calls [`Player::poll`] in a loop
//! while a [`Ticker`](crate::timing::Ticker) drives the shared
//! [`TickState`].
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::binutil::ParseError;
use crate::chip::ChipSink;
use crate::library::TrackLibrary;
use crate::meta::Gd3;
use crate::selector::{PlayMode, Strategy, TrackSelector};
use crate::source::ByteSource;
use crate::stream::{DEFAULT_BUFFER_CAPACITY, DEFAULT_LOOP_CACHE_LEN};
use crate::timing::{DEFAULT_SAMPLE_RATE, TickState};
use crate::vgm::{CommandError, TrackSession};

/// Loops played before the play mode moves on.
pub const DEFAULT_MAX_LOOPS: u32 = 3;

/// Errors surfaced by the command surface and by [`Player::poll`].
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The library is empty; no playback state can be established.
    #[error("no tracks available")]
    NoTracks,

    /// A requested track name matched nothing. The current track keeps
    /// playing.
    #[error("track not found: {0}")]
    NotFound(String),

    /// Every track in the library failed to load or verify.
    #[error("no playable track after {attempts} attempts")]
    NoPlayableTrack { attempts: usize },

    #[error(transparent)]
    Format(#[from] ParseError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Buffer sizes and playback policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Command buffer capacity in bytes.
    pub buffer_capacity: usize,
    /// Loop cache size in bytes, clamped to `buffer_capacity`.
    pub loop_cache_len: usize,
    /// Loops played before `play_mode` moves to another track.
    pub max_loops: u32,
    pub play_mode: PlayMode,
    /// Tick rate of the timing engine in Hz.
    pub sample_rate: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            loop_cache_len: DEFAULT_LOOP_CACHE_LEN,
            max_loops: DEFAULT_MAX_LOOPS,
            play_mode: PlayMode::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

type CommandErrorHook = Box<dyn FnMut(CommandError)>;

/// Streams tracks from `L` into the chip behind `K`.
pub struct Player<L, K, R = StdRng> {
    library: L,
    sink: K,
    selector: TrackSelector<R>,
    session: Option<TrackSession<Box<dyn ByteSource>>>,
    tick: Arc<TickState>,
    config: PlayerConfig,
    on_command_error: Option<CommandErrorHook>,
}

impl<L: TrackLibrary, K: ChipSink> Player<L, K, StdRng> {
    /// Create a player and load the first playable track.
    pub fn new(library: L, sink: K, config: PlayerConfig) -> Result<Self, PlayerError> {
        Self::with_rng(library, sink, config, StdRng::from_entropy())
    }
}

impl<L: TrackLibrary, K: ChipSink, R: Rng> Player<L, K, R> {
    /// Like [`Player::new`] with an explicit random source for shuffling.
    pub fn with_rng(library: L, sink: K, config: PlayerConfig, rng: R) -> Result<Self, PlayerError> {
        let mut player = Player {
            library,
            sink,
            selector: TrackSelector::with_rng(rng),
            session: None,
            tick: Arc::new(TickState::new()),
            config,
            on_command_error: None,
        };
        player.select_track(Strategy::First)?;
        Ok(player)
    }

    /// Switch tracks and return the index now playing.
    ///
    /// The tick context is held off for the whole switch. A track that fails
    /// to parse or verify is skipped with `Next`, at most once per track in
    /// the library. On `NotFound` the current track resumes untouched.
    pub fn select_track(&mut self, strategy: Strategy) -> Result<usize, PlayerError> {
        self.tick.set_ready(false);
        let index = match self.selector.select(&strategy, &self.library) {
            Ok(index) => index,
            Err(err) => {
                if self.session.is_some() {
                    self.tick.set_ready(true);
                }
                return Err(err);
            }
        };
        self.load_verified(index)
    }

    fn load_verified(&mut self, mut index: usize) -> Result<usize, PlayerError> {
        let attempts = self.library.len();
        for _ in 0..attempts {
            match self.load(index) {
                Ok(()) => return Ok(index),
                Err(err) => {
                    warn!(
                        "skipping {}: {err}",
                        self.library.name(index).unwrap_or("<unnamed>")
                    );
                    index = self.selector.select(&Strategy::Next, &self.library)?;
                }
            }
        }
        Err(PlayerError::NoPlayableTrack { attempts })
    }

    fn load(&mut self, index: usize) -> Result<(), PlayerError> {
        self.tick.clear_wait();
        self.session = None;

        let source = self.library.open(index)?;
        let mut session = TrackSession::open(
            source,
            self.config.buffer_capacity,
            self.config.loop_cache_len,
            Arc::clone(&self.tick),
        )?;
        if !session.verify() {
            return Err(ParseError::InvalidIdent(session.header().ident.to_le_bytes()).into());
        }
        let gd3 = session.load_metadata()?;
        info!(
            "playing [{index}] {}: {} / {} ({})",
            self.library.name(index).unwrap_or("<unnamed>"),
            gd3.track_name,
            gd3.game_name,
            gd3.author
        );

        self.sink.set_clock(session.header().ym2151_clock);
        self.sink.reset();
        self.session = Some(session);
        self.tick.set_ready(true);
        Ok(())
    }

    /// One iteration of the main loop.
    ///
    /// Tops up the command buffer by one byte and, when the wait counter has
    /// run out, executes the next command. A track that ends abruptly is
    /// abandoned for the next one, even while a wait is still pending; once the current track has looped
    /// `max_loops` times the play mode picks the next track.
    pub fn poll(&mut self) -> Result<(), PlayerError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let stepped = match session.refill() {
            Err(err) => Err(err),
            // A drained stream never counts its wait down, so step into the EOF.
            Ok(_) if self.tick.wait_samples() > 0 && !session.is_exhausted() => return Ok(()),
            Ok(_) => session.step(&mut self.sink),
        };

        let advance = match stepped {
            Ok(wait) => {
                self.tick.add_wait(wait);
                if let Some(err) = session.take_command_error()
                    && let Some(hook) = self.on_command_error.as_mut()
                {
                    hook(err);
                }
                if session.loop_count() >= self.config.max_loops {
                    self.config.play_mode.advance()
                } else {
                    None
                }
            }
            Err(err) => {
                warn!("playback stopped: {err}");
                Some(Strategy::Next)
            }
        };

        if let Some(strategy) = advance {
            self.select_track(strategy)?;
        }
        Ok(())
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.config.play_mode = mode;
    }

    pub fn play_mode(&self) -> PlayMode {
        self.config.play_mode
    }

    /// Metadata of the track now playing.
    pub fn current_metadata(&self) -> Option<&Gd3> {
        self.session.as_ref().map(|s| s.metadata())
    }

    pub fn current_index(&self) -> usize {
        self.selector.current()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.library.name(self.selector.current())
    }

    /// Loops completed by the current track.
    pub fn loop_count(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.loop_count())
    }

    pub fn session(&self) -> Option<&TrackSession<Box<dyn ByteSource>>> {
        self.session.as_ref()
    }

    /// True while a verified track is loaded and the tick may count down.
    pub fn is_ready(&self) -> bool {
        self.tick.is_ready()
    }

    /// Shared tick state, to hand to a [`Ticker`](crate::timing::Ticker).
    pub fn tick_state(&self) -> Arc<TickState> {
        Arc::clone(&self.tick)
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Observe unknown opcodes. Playback is not affected.
    pub fn on_command_error(&mut self, hook: impl FnMut(CommandError) + 'static) {
        self.on_command_error = Some(Box::new(hook));
    }
}
