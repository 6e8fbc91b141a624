//! Game settings and tuning
//!
//! Persisted as TOML next to the best-score files on native builds.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Direction;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Relaxed,
    #[default]
    Classic,
    Frantic,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Relaxed => "Relaxed",
            Difficulty::Classic => "Classic",
            Difficulty::Frantic => "Frantic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(Difficulty::Relaxed),
            "classic" | "normal" => Some(Difficulty::Classic),
            "frantic" | "hard" => Some(Difficulty::Frantic),
            _ => None,
        }
    }

    /// Snake tick interval at session start (ms)
    pub fn snake_start_ms(&self) -> u64 {
        match self {
            Difficulty::Relaxed => 200,
            Difficulty::Classic => INITIAL_SPEED_MS,
            Difficulty::Frantic => 100,
        }
    }

    /// How long a Whack target stays up (ms)
    pub fn whack_stay_ms(&self) -> u64 {
        match self {
            Difficulty::Relaxed => 1100,
            Difficulty::Classic => MOLE_STAY_MS,
            Difficulty::Frantic => 550,
        }
    }

    /// Period between Whack spawn attempts (ms)
    pub fn whack_spawn_ms(&self) -> u64 {
        match self {
            Difficulty::Relaxed => 800,
            Difficulty::Classic => MOLE_SPAWN_INTERVAL_MS,
            Difficulty::Frantic => 400,
        }
    }
}

/// Snake tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    /// Board is `grid_size` x `grid_size`
    pub grid_size: i32,
    /// Body length at session start
    pub initial_length: usize,
    pub initial_direction: Direction,
    pub initial_speed_ms: u64,
    pub min_speed_ms: u64,
    pub speed_decrement_ms: u64,
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            grid_size: SNAKE_GRID_SIZE,
            initial_length: INITIAL_SNAKE.len(),
            initial_direction: Direction::Up,
            initial_speed_ms: INITIAL_SPEED_MS,
            min_speed_ms: MIN_SPEED_MS,
            speed_decrement_ms: SPEED_DECREMENT_MS,
        }
    }
}

impl SnakeTuning {
    /// Clamp values into a playable range
    pub fn sanitized(mut self) -> Self {
        self.grid_size = self.grid_size.clamp(4, 256);
        let center = self.grid_size / 2;
        // Opening runs from the center toward the trailing edge
        let max_len = (self.grid_size - center).min(center + 1) as usize;
        self.initial_length = self.initial_length.clamp(1, max_len);
        self.min_speed_ms = self.min_speed_ms.max(1);
        self.initial_speed_ms = self.initial_speed_ms.max(self.min_speed_ms);
        self
    }
}

/// Whack tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhackTuning {
    pub slots: usize,
    pub duration_secs: u32,
    pub countdown_ms: u64,
    pub spawn_interval_ms: u64,
    pub stay_ms: u64,
}

impl Default for WhackTuning {
    fn default() -> Self {
        Self {
            slots: WHACK_SLOTS,
            duration_secs: GAME_DURATION_SECS,
            countdown_ms: COUNTDOWN_PERIOD_MS,
            spawn_interval_ms: MOLE_SPAWN_INTERVAL_MS,
            stay_ms: MOLE_STAY_MS,
        }
    }
}

impl WhackTuning {
    /// Clamp values into a playable range
    pub fn sanitized(mut self) -> Self {
        self.slots = self.slots.clamp(1, 64);
        self.duration_secs = self.duration_secs.max(1);
        self.countdown_ms = self.countdown_ms.max(1);
        self.spawn_interval_ms = self.spawn_interval_ms.max(1);
        self.stay_ms = self.stay_ms.max(1);
        self
    }
}

/// Commentary service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentarySettings {
    /// Ask the service at all (otherwise canned lines)
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub max_output_tokens: u32,
    /// Sampling temperature in hundredths (90 = 0.9)
    pub temperature_pct: u32,
}

impl Default for CommentarySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_ms: COMMENTARY_TIMEOUT_MS,
            max_output_tokens: 50,
            temperature_pct: 90,
        }
    }
}

impl CommentarySettings {
    pub fn temperature(&self) -> f32 {
        self.temperature_pct as f32 / 100.0
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub snake: SnakeTuning,
    pub whack: WhackTuning,
    pub commentary: CommentarySettings,
    /// Where best scores are stored (native only)
    pub best_score_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Classic,
            snake: SnakeTuning::default(),
            whack: WhackTuning::default(),
            commentary: CommentarySettings::default(),
            best_score_dir: ".tick-arcade".to_string(),
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset (applies preset defaults)
    pub fn from_preset(preset: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates preset-dependent tuning)
    pub fn apply_preset(&mut self, preset: Difficulty) {
        self.difficulty = preset;
        self.snake.initial_speed_ms = preset.snake_start_ms();
        self.whack.stay_ms = preset.whack_stay_ms();
        self.whack.spawn_interval_ms = preset.whack_spawn_ms();
    }

    /// Load settings from a TOML file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                log::info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
        };
        match Self::from_toml(&text) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse TOML. The difficulty preset fills the tuning it governs, and
    /// values written out under `[snake]`/`[whack]` win over the preset.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = text.parse()?;
        let explicit = |section: &str, key: &str| {
            table
                .get(section)
                .and_then(|s| s.get(key))
                .is_some()
        };
        let snake_start = explicit("snake", "initial_speed_ms");
        let whack_stay = explicit("whack", "stay_ms");
        let whack_spawn = explicit("whack", "spawn_interval_ms");

        let mut settings: Settings = toml::Value::Table(table.clone()).try_into()?;
        let file = settings.clone();
        settings.apply_preset(file.difficulty);
        if snake_start {
            settings.snake.initial_speed_ms = file.snake.initial_speed_ms;
        }
        if whack_stay {
            settings.whack.stay_ms = file.whack.stay_ms;
        }
        if whack_spawn {
            settings.whack.spawn_interval_ms = file.whack.spawn_interval_ms;
        }
        Ok(settings)
    }

    /// Save settings as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_matches_defaults() {
        assert_eq!(Settings::from_preset(Difficulty::Classic), Settings::default());
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Frantic));
        assert_eq!(Difficulty::from_str("meh"), None);
        assert_eq!(Difficulty::Relaxed.as_str(), "Relaxed");
    }

    #[test]
    fn test_sanitize_snake() {
        let t = SnakeTuning {
            grid_size: 1,
            initial_length: 50,
            initial_speed_ms: 10,
            min_speed_ms: 0,
            ..SnakeTuning::default()
        }
        .sanitized();
        assert_eq!(t.grid_size, 4);
        assert_eq!(t.initial_length, 2);
        assert_eq!(t.min_speed_ms, 1);
        assert_eq!(t.initial_speed_ms, 10);

        let t = SnakeTuning {
            initial_speed_ms: 20,
            min_speed_ms: 50,
            ..SnakeTuning::default()
        }
        .sanitized();
        assert_eq!(t.initial_speed_ms, 50);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [whack]
            duration_secs = 45
            "#,
        )
        .expect("valid toml");
        assert_eq!(settings.difficulty, Difficulty::Classic);
        assert_eq!(settings.whack.duration_secs, 45);
        assert_eq!(settings.whack.slots, WHACK_SLOTS);
        assert_eq!(settings.snake, SnakeTuning::default());
    }

    #[test]
    fn test_difficulty_in_file_applies_preset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "difficulty = \"Frantic\"\n").expect("write");

        let settings = Settings::load(&path);
        assert_eq!(settings.difficulty, Difficulty::Frantic);
        assert_eq!(settings.snake.initial_speed_ms, 100);
        assert_eq!(settings.whack.stay_ms, 550);
        assert_eq!(settings.whack.spawn_interval_ms, 400);
        assert_eq!(settings.snake.grid_size, SNAKE_GRID_SIZE);
    }

    #[test]
    fn test_explicit_tuning_beats_preset() {
        let settings = Settings::from_toml(
            r#"
            difficulty = "Relaxed"

            [snake]
            initial_speed_ms = 120

            [whack]
            stay_ms = 900
            "#,
        )
        .expect("valid toml");
        assert_eq!(settings.snake.initial_speed_ms, 120);
        assert_eq!(settings.whack.stay_ms, 900);
        assert_eq!(settings.whack.spawn_interval_ms, 800);
    }

    #[test]
    fn test_malformed_file_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "difficulty = [").expect("write");
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        let settings = Settings::from_preset(Difficulty::Relaxed);
        settings.save(&path).expect("save");
        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(Settings::load(dir.path().join("nope.toml")), Settings::default());
    }
}
