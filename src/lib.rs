//! Tick Arcade - two small tick-driven arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (timers, session lifecycle, Snake and Whack rules)
//! - `platform`: Input routing, clocks and score storage backends
//! - `persistence`: Versioned envelope for the stored best score
//! - `commentary`: Game-over commentary collaborator (async, best-effort)
//! - `settings`: Difficulty presets and per-game tuning

pub mod commentary;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{CommentaryError, StoreError};
pub use highscores::BestScore;
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Snake board is `SNAKE_GRID_SIZE` x `SNAKE_GRID_SIZE` cells
    pub const SNAKE_GRID_SIZE: i32 = 20;
    /// Starting body, head first
    pub const INITIAL_SNAKE: [(i32, i32); 3] = [(10, 10), (10, 11), (10, 12)];
    /// Tick interval at session start (ms)
    pub const INITIAL_SPEED_MS: u64 = 150;
    /// Tick interval never drops below this (ms)
    pub const MIN_SPEED_MS: u64 = 50;
    /// Interval reduction per food eaten (ms)
    pub const SPEED_DECREMENT_MS: u64 = 2;

    /// Whack board slot count (3x3)
    pub const WHACK_SLOTS: usize = 9;
    /// Session length in seconds
    pub const GAME_DURATION_SECS: u32 = 30;
    /// Countdown trigger period (ms)
    pub const COUNTDOWN_PERIOD_MS: u64 = 1000;
    /// How long a target stays up before hiding itself (ms)
    pub const MOLE_STAY_MS: u64 = 800;
    /// Period between spawn attempts (ms)
    pub const MOLE_SPAWN_INTERVAL_MS: u64 = 600;

    /// Commentary fetch gives up after this long (ms)
    pub const COMMENTARY_TIMEOUT_MS: u64 = 8000;

    /// Storage keys for the persisted best score
    pub const SNAKE_SCORE_KEY: &str = "snake-high-score";
    pub const WHACK_SCORE_KEY: &str = "whack-high-score";
}
