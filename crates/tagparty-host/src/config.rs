use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use tagparty_core::mode_registry::ModeId;

use crate::error::HostError;
use crate::session::SessionConfig;
use crate::sim::make_bots;

/// Log output style for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(HostError::InvalidConfig(format!(
                "log_format must be pretty or json, got {other}"
            ))),
        }
    }
}

/// Where [`HostConfig::load`] took its values from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Missing(String),
    Invalid { path: String, error: String },
}

impl ConfigSource {
    /// Report the outcome. Call after the subscriber is installed.
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!(%path, "Loaded configuration"),
            Self::Missing(path) => tracing::info!(%path, "No config file found, using defaults"),
            Self::Invalid { path, error } => {
                tracing::warn!(%path, %error, "Failed to parse config, using defaults");
            },
        }
    }
}

/// Top-level host configuration, loaded from `tagparty.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Mode guid, e.g. `team_infection`.
    pub mode: String,
    /// Number of simulated players.
    pub bots: usize,
    /// Delay between simulated tag attempts.
    pub tag_interval_ms: u64,
    /// How long the simulation runs before stopping the session.
    pub duration_secs: u64,
    /// Overrides the mode's own tick rate when set.
    pub tick_rate_hz: Option<f32>,
    pub seed: Option<u64>,
    pub log_format: LogFormat,
    /// Extra per-session overrides passed straight to the mode.
    pub custom: HashMap<String, serde_json::Value>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mode: ModeId::TeamInfection.guid().to_string(),
            bots: 6,
            tag_interval_ms: 250,
            duration_secs: 60,
            tick_rate_hz: None,
            seed: None,
            log_format: LogFormat::Pretty,
            custom: HashMap::new(),
        }
    }
}

impl HostConfig {
    pub fn mode_id(&self) -> Result<ModeId, HostError> {
        self.mode
            .parse()
            .map_err(|_| HostError::UnknownMode(self.mode.clone()))
    }

    pub fn tag_interval(&self) -> Duration {
        Duration::from_millis(self.tag_interval_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Reject configurations the simulator cannot run.
    pub fn validate(&self) -> Result<(), HostError> {
        self.mode_id()?;
        if self.bots < 2 {
            return Err(HostError::InvalidConfig("bots must be at least 2".to_string()));
        }
        if self.bots > usize::from(u8::MAX) {
            return Err(HostError::InvalidConfig(format!(
                "bots must be at most {}",
                u8::MAX
            )));
        }
        if self.tag_interval_ms == 0 {
            return Err(HostError::InvalidConfig(
                "tag_interval_ms must be > 0".to_string(),
            ));
        }
        if self.duration_secs == 0 {
            return Err(HostError::InvalidConfig("duration_secs must be > 0".to_string()));
        }
        if let Some(rate) = self.tick_rate_hz
            && !(rate > 0.0 && rate <= 240.0)
        {
            return Err(HostError::InvalidConfig(format!(
                "tick_rate_hz must be in (0, 240], got {rate}"
            )));
        }
        Ok(())
    }

    /// Load config from `TAGPARTY_CONFIG` or `tagparty.toml`, then apply env var overrides.
    pub fn load() -> (Self, ConfigSource) {
        let path = std::env::var("TAGPARTY_CONFIG").unwrap_or_else(|_| "tagparty.toml".to_string());
        let contents = std::fs::read_to_string(&path).ok();
        let (mut config, source) = Self::from_contents(path, contents.as_deref());
        config.apply_env_overrides(|key| std::env::var(key).ok());
        (config, source)
    }

    fn from_contents(path: String, contents: Option<&str>) -> (Self, ConfigSource) {
        let Some(contents) = contents else {
            return (Self::default(), ConfigSource::Missing(path));
        };
        match toml::from_str::<HostConfig>(contents) {
            Ok(cfg) => (cfg, ConfigSource::File(path)),
            Err(e) => (
                Self::default(),
                ConfigSource::Invalid {
                    path,
                    error: e.to_string(),
                },
            ),
        }
    }

    /// Apply `TAGPARTY_*` overrides from `lookup`. Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(mode) = lookup("TAGPARTY_MODE")
            && !mode.is_empty()
        {
            self.mode = mode;
        }
        if let Some(val) = lookup("TAGPARTY_BOTS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.bots = n;
        }
        if let Some(val) = lookup("TAGPARTY_TAG_INTERVAL_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.tag_interval_ms = n;
        }
        if let Some(val) = lookup("TAGPARTY_DURATION_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.duration_secs = n;
        }
        if let Some(val) = lookup("TAGPARTY_TICK_RATE")
            && let Ok(n) = val.parse::<f32>()
        {
            self.tick_rate_hz = Some(n);
        }
        if let Some(val) = lookup("TAGPARTY_SEED")
            && let Ok(n) = val.parse::<u64>()
        {
            self.seed = Some(n);
        }
        if let Some(val) = lookup("TAGPARTY_LOG_FORMAT")
            && let Ok(format) = val.parse::<LogFormat>()
        {
            self.log_format = format;
        }
    }

    /// Session settings for the configured mode with `bots` simulated players.
    pub fn session_config(&self) -> Result<SessionConfig, HostError> {
        let mut custom = self.custom.clone();
        if let Some(seed) = self.seed {
            custom.insert("seed".to_string(), serde_json::json!(seed));
        }
        Ok(SessionConfig {
            mode: self.mode_id()?,
            players: make_bots(self.bots),
            custom,
            tick_rate_hz: self.tick_rate_hz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_outcome_is_reported_not_swallowed() {
        let (cfg, source) = HostConfig::from_contents("a.toml".to_string(), None);
        assert_eq!(source, ConfigSource::Missing("a.toml".to_string()));
        assert_eq!(cfg.bots, 6);

        let (cfg, source) =
            HostConfig::from_contents("b.toml".to_string(), Some("bots = \"many\""));
        assert!(matches!(source, ConfigSource::Invalid { ref path, .. } if path == "b.toml"));
        assert_eq!(cfg.bots, 6);

        let (cfg, source) = HostConfig::from_contents("c.toml".to_string(), Some("bots = 3"));
        assert_eq!(source, ConfigSource::File("c.toml".to_string()));
        assert_eq!(cfg.bots, 3);
    }

    #[test]
    fn default_config_values() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.mode, "team_infection");
        assert_eq!(cfg.bots, 6);
        assert_eq!(cfg.tag_interval(), Duration::from_millis(250));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
mode = "hot_potato"
bots = 4
tag_interval_ms = 100
duration_secs = 5
tick_rate_hz = 30.0
seed = 11
log_format = "json"

[custom]
max_potato_secs = 8.0
"#;
        let cfg: HostConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.mode_id(), Ok(ModeId::HotPotato));
        assert_eq!(cfg.bots, 4);
        assert_eq!(cfg.tick_rate_hz, Some(30.0));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(
            cfg.custom.get("max_potato_secs").and_then(|v| v.as_f64()),
            Some(8.0)
        );
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut cfg = HostConfig::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("TAGPARTY_MODE", "team-tag"),
            ("TAGPARTY_BOTS", "3"),
            ("TAGPARTY_SEED", "5"),
            ("TAGPARTY_LOG_FORMAT", "JSON"),
            ("TAGPARTY_TICK_RATE", "fast"),
        ]);
        cfg.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.mode_id(), Ok(ModeId::TeamTag));
        assert_eq!(cfg.bots, 3);
        assert_eq!(cfg.seed, Some(5));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.tick_rate_hz, None);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let unknown = HostConfig {
            mode: "freeze_tag".to_string(),
            ..HostConfig::default()
        };
        assert_eq!(
            unknown.validate(),
            Err(HostError::UnknownMode("freeze_tag".to_string()))
        );

        let lonely = HostConfig {
            bots: 1,
            ..HostConfig::default()
        };
        assert!(matches!(lonely.validate(), Err(HostError::InvalidConfig(_))));

        let frozen = HostConfig {
            tick_rate_hz: Some(0.0),
            ..HostConfig::default()
        };
        assert!(matches!(frozen.validate(), Err(HostError::InvalidConfig(_))));

        let instant = HostConfig {
            tag_interval_ms: 0,
            ..HostConfig::default()
        };
        assert!(instant.validate().is_err());
    }

    #[test]
    fn session_config_carries_seed_and_bots() {
        let cfg = HostConfig {
            seed: Some(99),
            bots: 4,
            ..HostConfig::default()
        };
        let session = cfg.session_config().unwrap();
        assert_eq!(session.mode, ModeId::TeamInfection);
        assert_eq!(session.players.len(), 4);
        assert_eq!(session.custom.get("seed").and_then(|v| v.as_u64()), Some(99));
    }
}
