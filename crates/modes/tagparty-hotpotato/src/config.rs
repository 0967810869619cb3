use serde::{Deserialize, Serialize};

use tagparty_core::effects::SoundCue;
use tagparty_core::mode_trait::RoundConfig;
use tagparty_core::round::RoundRules;

/// Data-driven configuration for Hot Potato. All times are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotPotatoConfig {
    pub min_players: usize,
    pub countdown_secs: f32,
    /// Fuse length of the first heat.
    pub max_potato_secs: f32,
    /// Floor the fuse shrinks towards.
    pub min_potato_secs: f32,
    /// How much shorter each heat's fuse is than the last.
    pub potato_decrease_secs: f32,
    /// Added to the fuse every time the potato changes hands.
    pub pass_bonus_secs: f32,
    /// Minimum gap between two slows on the same target.
    pub slow_cooldown_secs: f32,
    /// Broadcast when the fuse runs out.
    pub explosion_sound: Option<SoundCue>,
    pub seed: Option<u64>,
}

impl Default for HotPotatoConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            countdown_secs: 3.0,
            max_potato_secs: 30.0,
            min_potato_secs: 10.0,
            potato_decrease_secs: 0.5,
            pass_bonus_secs: 3.0,
            slow_cooldown_secs: 5.0,
            explosion_sound: None,
            seed: None,
        }
    }
}

impl HotPotatoConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("TAGPARTY_HOTPOTATO_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/hotpotato.toml")
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
        if let Some(secs) = round.f32_override("max_potato_secs") {
            config.max_potato_secs = secs;
        }
        if let Some(secs) = round.f32_override("min_potato_secs") {
            config.min_potato_secs = secs;
        }
        if let Some(min) = round.u64_override("min_players") {
            config.min_players = min as usize;
        }
        if let Some(seed) = round.u64_override("seed") {
            config.seed = Some(seed);
        }
        config.sanitized()
    }

    /// Keep the room minimum at two and the fuse bounds positive and ordered.
    pub fn sanitized(mut self) -> Self {
        self.min_players = self.min_players.max(2);
        self.countdown_secs = self.countdown_secs.max(0.0);
        self.max_potato_secs = self.max_potato_secs.max(0.1);
        self.min_potato_secs = self.min_potato_secs.clamp(0.1, self.max_potato_secs);
        self.potato_decrease_secs = self.potato_decrease_secs.max(0.0);
        self
    }

    pub fn rules(&self) -> RoundRules {
        RoundRules {
            min_players: self.min_players,
            countdown_secs: self.countdown_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fuse_values() {
        let cfg = HotPotatoConfig::default();
        assert!((cfg.max_potato_secs - 30.0).abs() < f32::EPSILON);
        assert!((cfg.min_potato_secs - 10.0).abs() < f32::EPSILON);
        assert!((cfg.potato_decrease_secs - 0.5).abs() < f32::EPSILON);
        assert!((cfg.pass_bonus_secs - 3.0).abs() < f32::EPSILON);
        assert!((cfg.slow_cooldown_secs - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn parse_toml_with_explosion_sound() {
        let cfg: HotPotatoConfig = toml::from_str(
            r#"
max_potato_secs = 20.0

[explosion_sound]
id = 3
volume = 1.0
"#,
        )
        .unwrap();
        assert!((cfg.max_potato_secs - 20.0).abs() < f32::EPSILON);
        assert_eq!(cfg.explosion_sound.map(|c| c.id), Some(3));
        assert!((cfg.min_potato_secs - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn inverted_bounds_are_sanitized() {
        let mut round = RoundConfig::default();
        round
            .custom
            .insert("max_potato_secs".to_string(), serde_json::json!(5.0));
        let cfg = HotPotatoConfig::default().with_overrides(&round);
        assert!((cfg.max_potato_secs - 5.0).abs() < f32::EPSILON);
        assert!((cfg.min_potato_secs - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn loaded_minimum_below_two_is_clamped() {
        let cfg: HotPotatoConfig = toml::from_str("min_players = 1\ncountdown_secs = -1.0").unwrap();
        let cfg = cfg.sanitized();
        assert_eq!(cfg.min_players, 2);
        assert_eq!(cfg.rules().min_players, 2);
        assert_eq!(cfg.countdown_secs, 0.0);
    }
}
