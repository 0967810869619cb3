use serde::{Deserialize, Serialize};

use tagparty_core::effects::SoundCue;
use tagparty_core::mode_trait::RoundConfig;
use tagparty_core::round::RoundRules;

/// Data-driven configuration for Team Tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamTagConfig {
    pub min_players: usize,
    pub countdown_secs: f32,
    /// Seconds a freshly converted player cannot be tagged again.
    pub convert_grace_secs: f32,
    pub tag_sound: Option<SoundCue>,
    pub seed: Option<u64>,
}

impl Default for TeamTagConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            countdown_secs: 5.0,
            convert_grace_secs: 2.0,
            tag_sound: None,
            seed: None,
        }
    }
}

impl TeamTagConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("TAGPARTY_TEAMTAG_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/teamtag.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }

    pub fn with_overrides(&self, round: &RoundConfig) -> Self {
        let mut config = self.clone();
        if let Some(secs) = round.f32_override("countdown_secs") {
            config.countdown_secs = secs.max(0.0);
        }
        if let Some(secs) = round.f32_override("convert_grace_secs") {
            config.convert_grace_secs = secs.max(0.0);
        }
        if let Some(min) = round.u64_override("min_players") {
            config.min_players = min as usize;
        }
        if let Some(seed) = round.u64_override("seed") {
            config.seed = Some(seed);
        }
        config.sanitized()
    }

    /// Clamp values the round machine cannot run with.
    pub fn sanitized(mut self) -> Self {
        self.min_players = self.min_players.max(2);
        self.countdown_secs = self.countdown_secs.max(0.0);
        self.convert_grace_secs = self.convert_grace_secs.max(0.0);
        self
    }

    pub fn rules(&self) -> RoundRules {
        RoundRules {
            min_players: self.min_players,
            countdown_secs: self.countdown_secs,
        }
    }
}
