//! Game-over commentary
//!
//! One short line of text per finished session, fetched from a text
//! generation service after the engine enters GameOver. The fetch is
//! best-effort: every failure collapses into a fixed fallback line, and
//! answers are tagged with the session epoch so the engine can drop them if
//! the player has already moved on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CommentaryError;
use crate::sim::GameTheme;

#[cfg(not(target_arch = "wasm32"))]
mod desk;
#[cfg(not(target_arch = "wasm32"))]
mod gemini;

#[cfg(not(target_arch = "wasm32"))]
pub use desk::{CommentaryDesk, fetch_or_fallback};
#[cfg(not(target_arch = "wasm32"))]
pub use gemini::GeminiProvider;

/// Shown when the service answered with nothing
pub const FALLBACK_EMPTY: &str = "Game Over! Better luck next time.";
/// Shown when the service failed or timed out
pub const FALLBACK_FAILED: &str = "Game Over! (AI currently sleeping)";

/// Scores below this get teased
pub const LOW_SCORE: u32 = 5;
/// Scores above this get praised
pub const HIGH_SCORE: u32 = 20;

/// Everything the service is told about a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryRequest {
    pub score: u32,
    /// Best score before this session ended
    pub high_score: u32,
    pub new_high_score: bool,
    pub theme: GameTheme,
}

impl CommentaryRequest {
    pub fn new(theme: GameTheme, score: u32, previous_best: u32) -> Self {
        Self {
            score,
            high_score: previous_best,
            new_high_score: score > previous_best,
            theme,
        }
    }

    /// Prompt text sent to the model
    pub fn prompt(&self) -> String {
        let verdict = if self.new_high_score {
            "I beat my high score!"
        } else {
            "I did not beat my high score."
        };
        format!(
            "I just finished playing a game of {}.\n\
             My Score: {}.\n\
             My previous High Score: {}.\n\
             {}\n\n\
             Please give me a very short, witty, 1-sentence commentary on my performance.\n\
             If the score is low (under {}), be sarcastically funny.\n\
             If the score is high (over {}), be impressed.\n\
             Otherwise, be encouraging but casual.",
            self.theme.as_str(),
            self.score,
            self.high_score,
            verdict,
            LOW_SCORE,
            HIGH_SCORE
        )
    }
}

/// Commentary text tagged with the epoch it was requested for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub epoch: u64,
    pub text: String,
}

/// Source of commentary text
#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    async fn comment(&self, request: &CommentaryRequest) -> Result<String, CommentaryError>;
}

/// Offline provider: fixed line per score band
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedProvider;

impl CannedProvider {
    pub fn line(request: &CommentaryRequest) -> String {
        let game = request.theme.as_str();
        if request.score < LOW_SCORE {
            format!("{} points? The {} board barely noticed you were there.", request.score, game)
        } else if request.score > HIGH_SCORE {
            format!("{} points at {}. Genuinely impressive.", request.score, game)
        } else if request.new_high_score {
            format!("A new best of {}. Keep that streak going.", request.score)
        } else {
            format!("{} points. Not bad, go again.", request.score)
        }
    }
}

#[async_trait]
impl CommentaryProvider for CannedProvider {
    async fn comment(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        Ok(Self::line(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_flags_new_best() {
        let req = CommentaryRequest::new(GameTheme::Snake, 12, 10);
        assert!(req.new_high_score);
        assert_eq!(req.high_score, 10);

        let req = CommentaryRequest::new(GameTheme::Whack, 10, 10);
        assert!(!req.new_high_score);
    }

    #[test]
    fn test_prompt_mentions_context() {
        let prompt = CommentaryRequest::new(GameTheme::Whack, 3, 9).prompt();
        assert!(prompt.contains("game of Whack-a-Mole"));
        assert!(prompt.contains("My Score: 3."));
        assert!(prompt.contains("My previous High Score: 9."));
        assert!(prompt.contains("I did not beat my high score."));
        assert!(prompt.contains("under 5"));
    }

    #[test]
    fn test_canned_bands() {
        let low = CannedProvider::line(&CommentaryRequest::new(GameTheme::Snake, 2, 0));
        assert!(low.contains("barely noticed"));
        let high = CannedProvider::line(&CommentaryRequest::new(GameTheme::Snake, 25, 30));
        assert!(high.contains("impressive"));
        let best = CannedProvider::line(&CommentaryRequest::new(GameTheme::Snake, 8, 7));
        assert!(best.contains("new best"));
        let plain = CannedProvider::line(&CommentaryRequest::new(GameTheme::Snake, 8, 9));
        assert!(plain.contains("go again"));
    }
}
