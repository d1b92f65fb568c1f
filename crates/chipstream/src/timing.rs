//! Timing engine.
//!
//! A fixed-rate tick, one per output sample, counts down the wait returned
//! by the interpreter. The tick context owns nothing: it reads the `ready`
//! and `has_data` flags and decrements `wait_samples`, and that decrement is
//! the only thing it ever does. Every other piece of playback state is
//! touched only by the main context, so the atomics in [`TickState`] are the
//! whole synchronization surface.
//!
//! Track switches clear `ready` for their whole duration; while it is clear
//! the tick is a no-op.
use log::debug;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default tick rate: the container's fixed 44.1 kHz sample clock.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// State shared between the main context and the tick context.
#[derive(Debug, Default)]
pub struct TickState {
    ready: AtomicBool,
    has_data: AtomicBool,
    wait_samples: AtomicU16,
}

impl TickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One sample period. Decrements the wait counter when playback is
    /// ready, the command buffer holds data and the counter is nonzero.
    /// Returns whether the counter moved.
    pub fn tick(&self) -> bool {
        if !self.ready.load(Ordering::Acquire) || !self.has_data.load(Ordering::Acquire) {
            return false;
        }
        self.wait_samples
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| w.checked_sub(1))
            .is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn wait_samples(&self) -> u16 {
        self.wait_samples.load(Ordering::Acquire)
    }

    pub(crate) fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    pub(crate) fn set_has_data(&self, has_data: bool) {
        self.has_data.store(has_data, Ordering::Release);
    }

    /// Add an interpreter wait. Only called when the counter is zero.
    pub(crate) fn add_wait(&self, samples: u16) {
        if samples == 0 {
            return;
        }
        // fetch_update cannot fail with a closure that always returns Some.
        let _ = self
            .wait_samples
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| {
                Some(w.saturating_add(samples))
            });
    }

    /// Zero the counter. Only valid while `ready` is clear.
    pub(crate) fn clear_wait(&self) {
        debug_assert!(!self.is_ready());
        self.wait_samples.store(0, Ordering::Release);
    }
}

/// Dedicated thread driving [`TickState::tick`] at a fixed rate.
///
/// Ticks are scheduled against a monotonic deadline: the thread sleeps while
/// the next deadline is far away and spins once it is close. When it falls
/// more than 100 ms behind (the process was descheduled) it drops the missed
/// ticks instead of bursting them. Dropping the `Ticker` stops the thread.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(state: Arc<TickState>, rate_hz: u32) -> io::Result<Self> {
        let rate_hz = rate_hz.max(1);
        let period = Duration::from_secs(1) / rate_hz;
        let max_lag = Duration::from_millis(100);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("chipstream-tick".into())
            .spawn(move || {
                let mut next = Instant::now() + period;
                while !stop_flag.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    if now >= next {
                        state.tick();
                        next += period;
                        if now.duration_since(next) > max_lag {
                            debug!("tick thread fell behind, resyncing");
                            next = now + period;
                        }
                    } else if next - now > Duration::from_micros(500) {
                        thread::sleep(next - now - Duration::from_micros(250));
                    } else {
                        std::hint::spin_loop();
                    }
                }
            })?;

        Ok(Ticker {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
