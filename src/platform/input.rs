//! Raw input -> intent routing
//!
//! Keyboard, on-screen buttons and touch all land here; the engine never sees
//! where an intent came from.

use crate::sim::{Direction, Intent, SessionStatus};

/// Keys the games react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    W,
    A,
    S,
    D,
    Space,
    Escape,
    P,
    R,
    /// Top-row or numpad digit 0-9
    Digit(u8),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` style name
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            " " | "Space" | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            other => {
                let mut chars = other.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return None;
                };
                match c.to_ascii_lowercase() {
                    'w' => Key::W,
                    'a' => Key::A,
                    's' => Key::S,
                    'd' => Key::D,
                    'p' => Key::P,
                    'r' => Key::R,
                    d @ '0'..='9' => Key::Digit(d as u8 - b'0'),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Arrow keys and WASD
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Key::ArrowUp | Key::W => Some(Direction::Up),
            Key::ArrowDown | Key::S => Some(Direction::Down),
            Key::ArrowLeft | Key::A => Some(Direction::Left),
            Key::ArrowRight | Key::D => Some(Direction::Right),
            _ => None,
        }
    }
}

/// An input event before routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    Key(Key),
    /// On-screen D-pad button or swipe
    Pad(Direction),
    /// Pointer/touch on a Whack slot
    Tap(usize),
    /// Start/Pause button
    StartPause,
    /// Play Again button
    PlayAgain,
}

/// Lifecycle keys shared by both games
fn route_lifecycle<A>(input: RawInput, status: SessionStatus) -> Option<Intent<A>> {
    match input {
        RawInput::Key(Key::Space) => Some(if status == SessionStatus::GameOver {
            Intent::Reset
        } else {
            Intent::TogglePause
        }),
        RawInput::Key(Key::P | Key::Escape) | RawInput::StartPause => {
            (status != SessionStatus::GameOver).then_some(Intent::TogglePause)
        }
        RawInput::Key(Key::R) | RawInput::PlayAgain => Some(Intent::Reset),
        _ => None,
    }
}

/// Snake routing: directions pass through; validation against the committed
/// heading happens in the engine's direction latch.
pub fn route_snake(input: RawInput, status: SessionStatus) -> Option<Intent<Direction>> {
    let direction = match input {
        RawInput::Key(key) => key.direction(),
        RawInput::Pad(direction) => Some(direction),
        _ => None,
    };
    match direction {
        Some(direction) => match status {
            SessionStatus::Idle | SessionStatus::Playing => Some(Intent::Action(direction)),
            SessionStatus::Paused | SessionStatus::GameOver => None,
        },
        None => route_lifecycle(input, status),
    }
}

/// Whack routing: digits 1-9 and taps name a slot; only forwarded while Playing
pub fn route_whack(input: RawInput, status: SessionStatus) -> Option<Intent<usize>> {
    let slot = match input {
        RawInput::Key(Key::Digit(d)) if d >= 1 => Some(usize::from(d - 1)),
        RawInput::Tap(slot) => Some(slot),
        _ => None,
    };
    match slot {
        Some(slot) => (status == SessionStatus::Playing).then_some(Intent::Action(slot)),
        None => route_lifecycle(input, status),
    }
}
