//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual millisecond clock only (hosts feed elapsed time in)
//! - Seeded RNG only
//! - Timers fire in due order, ties in arming order
//! - No rendering or I/O; storage and commentary are reached through the
//!   best-score bridge and the commentary slot

pub mod autopilot;
pub mod engine;
pub mod grid;
pub mod session;
pub mod snake;
pub mod timers;
pub mod whack;

pub use autopilot::{WhackPilot, steer_snake};
pub use engine::{Engine, Rules, Snapshot, Step, StepCtx};
pub use grid::{Coord, Direction, Grid};
pub use session::{
    CommentarySlot, EndReason, GameEvent, GameTheme, Intent, Session, SessionStatus,
};
pub use snake::{DirectionLatch, Opening, Snake, SnakeBoard, SnakeRules, SnakeStep, SnakeTimer};
pub use timers::{Fired, TimerId, TimerRegistry};
pub use whack::{PendingHides, WhackBoard, WhackRules, WhackTimer};

/// Snake on the shared skeleton
pub type SnakeEngine = Engine<SnakeRules>;
/// Whack on the shared skeleton
pub type WhackEngine = Engine<WhackRules>;
