use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Wall-clock seam for the replay engine.
///
/// `now_nanos` must be monotonic; the absolute origin is arbitrary as the
/// engine only works with differences.
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> i64;
    fn sleep(&self, duration: Duration);
}

/// Real time: a monotonic clock anchored at construction, sleeping on the
/// current thread.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        self.origin.elapsed().as_nanos() as i64
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when slept on.
///
/// Sleeping advances the shared counter and returns immediately, which
/// makes paced replay run as fast as possible while keeping every pacing
/// decision identical to real time. Clones share the same counter, so
/// tests can hold one handle and observe the time a session accumulates.
#[derive(Clone)]
pub struct VirtualClock {
    now: Arc<AtomicI64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.fetch_add(duration.as_nanos() as i64, Ordering::SeqCst);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now_nanos(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
