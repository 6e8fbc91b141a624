//! Clocks feeding elapsed time into the engine

#[cfg(not(target_arch = "wasm32"))]
use tokio::time::Instant;

/// Milliseconds since an arbitrary, fixed origin
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock, origin at construction. Reads tokio's clock, so a paused
/// test runtime drives it.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt_ms: u64) -> u64 {
        self.now_ms += dt_ms;
        self.now_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
