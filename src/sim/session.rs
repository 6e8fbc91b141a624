//! Session lifecycle shared by both games

use serde::{Deserialize, Serialize};

/// Lifecycle of one play-through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Waiting for the first start/direction input
    #[default]
    Idle,
    /// Timers armed, state advancing
    Playing,
    /// Frozen; every timer cancelled
    Paused,
    /// Terminal until reset
    GameOver,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "IDLE",
            SessionStatus::Playing => "PLAYING",
            SessionStatus::Paused => "PAUSED",
            SessionStatus::GameOver => "GAME_OVER",
        }
    }
}

/// Which game a session belongs to (also the commentary theme)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameTheme {
    Snake,
    Whack,
}

impl GameTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameTheme::Snake => "Snake",
            GameTheme::Whack => "Whack-a-Mole",
        }
    }
}

/// Player or UI intent, already decoded from its raw origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent<A> {
    /// Game-specific action (a direction, a slot to whack)
    Action(A),
    /// Idle/Paused -> Playing
    Start,
    /// Playing <-> Paused (Idle -> Playing)
    TogglePause,
    /// Reinitialize the session and start playing
    Reset,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Snake head left the board
    Wall,
    /// Snake head ran into the body
    SelfCollision,
    /// No free cell left for food
    BoardFull,
    /// Whack countdown reached zero
    TimeUp,
}

impl EndReason {
    /// Short line describing how the run ended
    pub fn describe(&self) -> &'static str {
        match self {
            EndReason::Wall => "Snake hit the wall!",
            EndReason::SelfCollision => "Snake bit itself!",
            EndReason::BoardFull => "Board full, the snake wins!",
            EndReason::TimeUp => "Time's up!",
        }
    }
}

/// Notable moments, for sound cues and hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Started { epoch: u64 },
    Paused,
    Resumed,
    Ate { score: u32 },
    Whacked { slot: usize, score: u32 },
    NewHighScore { score: u32 },
    GameOver {
        epoch: u64,
        reason: EndReason,
        score: u32,
        /// Best score before this session was recorded
        previous_best: u32,
    },
}

/// Commentary display slot, separate from game state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommentarySlot {
    #[default]
    Empty,
    /// Requested for the given session epoch
    Pending { epoch: u64 },
    Ready { epoch: u64, text: String },
}

impl CommentarySlot {
    pub fn text(&self) -> Option<&str> {
        match self {
            CommentarySlot::Ready { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CommentarySlot::Pending { .. })
    }
}

/// Per-session counters plus the lifecycle status.
///
/// `epoch` increases on every reset and tags anything that may arrive late.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub status: SessionStatus,
    pub epoch: u64,
    pub score: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    /// Start a fresh play-through: next epoch, zero score
    pub fn begin_next(&mut self) {
        self.epoch += 1;
        self.score = 0;
        self.status = SessionStatus::Playing;
    }
}
