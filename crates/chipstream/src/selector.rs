//! Track selection strategies.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::library::TrackLibrary;
use crate::player::PlayerError;

/// How the next track is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Index 0. Used once, when the player starts.
    First,
    Next,
    Previous,
    /// Uniformly any other track; the current one when it is the only one.
    Random,
    /// The first track whose name matches, ignoring surrounding whitespace.
    Request(String),
}

/// What happens once a track has looped `max_loops` times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayMode {
    /// Keep looping the current track.
    Loop,
    /// Move to a random other track.
    #[default]
    Shuffle,
    /// Move to the next track in storage order.
    InOrder,
}

impl PlayMode {
    /// Strategy applied when the current track has looped enough, `None`
    /// for endless looping.
    pub fn advance(self) -> Option<Strategy> {
        match self {
            PlayMode::Loop => None,
            PlayMode::Shuffle => Some(Strategy::Random),
            PlayMode::InOrder => Some(Strategy::Next),
        }
    }
}

/// Current track index and the random source for [`Strategy::Random`].
#[derive(Debug)]
pub struct TrackSelector<R = StdRng> {
    current: usize,
    rng: R,
}

impl TrackSelector<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for TrackSelector<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> TrackSelector<R> {
    pub fn with_rng(rng: R) -> Self {
        TrackSelector { current: 0, rng }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Apply `strategy` and return the new current index.
    ///
    /// Fails with `NoTracks` on an empty library and with `NotFound` when a
    /// request matches nothing; in both cases the current index is kept.
    pub fn select<L: TrackLibrary + ?Sized>(
        &mut self,
        strategy: &Strategy,
        library: &L,
    ) -> Result<usize, PlayerError> {
        let n = library.len();
        if n == 0 {
            return Err(PlayerError::NoTracks);
        }
        let i = self.current.min(n - 1);
        self.current = match strategy {
            Strategy::First => 0,
            Strategy::Next => (i + 1) % n,
            Strategy::Previous => (i + n - 1) % n,
            Strategy::Random if n == 1 => i,
            Strategy::Random => {
                let j = self.rng.gen_range(0..n - 1);
                if j >= i { j + 1 } else { j }
            }
            Strategy::Request(name) => library
                .position(name)
                .ok_or_else(|| PlayerError::NotFound(name.trim().to_string()))?,
        };
        Ok(self.current)
    }
}
