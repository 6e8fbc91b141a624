//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (virtual or wall clock driving the engine)
//! - Input events (keys, pointer taps, swipes -> intents)
//! - Storage (files on native, LocalStorage on web)

pub mod input;
pub mod storage;
pub mod time;

pub use input::{Key, RawInput, route_snake, route_whack};
pub use storage::{FileStore, MemoryStore, ScoreStore};
#[cfg(not(target_arch = "wasm32"))]
pub use time::SystemClock;
pub use time::{Clock, ManualClock};
