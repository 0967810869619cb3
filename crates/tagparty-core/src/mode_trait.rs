use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::effects::EffectRequest;
use crate::mode_registry::ModeId;
use crate::net::protocol::ProtocolError;
use crate::player::Player;
use crate::round::RoundState;

/// Opaque per-connection player identifier.
pub type PlayerId = u64;

/// Core trait every tagparty game mode implements.
///
/// The host engine owns networking, rendering and room membership; the mode
/// only owns its round state and the rules around it. Hosts should drive a
/// mode through [`crate::authority::ModeHandle`] so that mutating callbacks
/// are only ever applied on the authoritative peer.
pub trait GameMode: Send + Sync {
    /// Mode metadata for the room browser.
    fn metadata(&self) -> ModeMetadata;

    /// Called when the mode becomes the active one for a room.
    fn start_playing(&mut self, players: &[Player], config: &RoundConfig);

    /// Called when the mode is switched away from. Drops all per-round data.
    fn stop_playing(&mut self);

    /// Periodic authority tick. `dt` is elapsed engine time in seconds.
    fn update(&mut self, dt: f32) -> Vec<ModeEvent>;

    /// Called when a player enters the room (including reconnects).
    fn player_joined(&mut self, player: &Player) -> Vec<ModeEvent>;

    /// Called when a player leaves the room.
    fn player_left(&mut self, player_id: PlayerId) -> Vec<ModeEvent>;

    /// Whether `tagger` is currently allowed to tag `tagged`.
    fn can_tag(&self, tagger: PlayerId, tagged: PlayerId) -> bool;

    /// Called when the host reports a tag between two players.
    fn report_tag(&mut self, tagger: PlayerId, tagged: PlayerId) -> Vec<ModeEvent>;

    /// Material index the renderer should use for this player.
    fn material_index(&self, player_id: PlayerId) -> u8;

    /// Current round state (authoritative value or last replicated value).
    fn round_state(&self) -> RoundState;

    /// Serialize the replicated projection for broadcast.
    fn serialize_state(&self) -> Vec<u8>;

    /// Overwrite the local projection with a snapshot from the authoritative peer.
    fn apply_state(&mut self, state: &[u8]) -> Result<(), ProtocolError>;

    /// Rebuild authority-only bookkeeping from the current projection after
    /// this peer takes over as the authoritative peer.
    fn promote(&mut self, players: &[Player]);

    /// Authority tick rate in Hz.
    fn tick_rate(&self) -> f32 {
        10.0
    }
}

/// Mode metadata for the room browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeMetadata {
    pub id: ModeId,
    pub name: String,
    pub description: String,
    pub min_players: u8,
    pub max_players: u8,
}

/// Per-session overrides handed to [`GameMode::start_playing`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundConfig {
    pub custom: HashMap<String, serde_json::Value>,
}

impl RoundConfig {
    pub fn f32_override(&self, key: &str) -> Option<f32> {
        self.custom
            .get(key)
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
    }

    pub fn u64_override(&self, key: &str) -> Option<u64> {
        self.custom.get(key).and_then(|v| v.as_u64())
    }
}

/// Events emitted by a mode from its lifecycle callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModeEvent {
    PhaseChanged { from: RoundState, to: RoundState },
    /// Roles were (re)assigned for a fresh round or heat.
    RolesAssigned,
    TagAccepted { tagger: PlayerId, tagged: PlayerId },
    /// Win condition met. Empty `winners` means the round was reset without a winner.
    RoundComplete { winners: Vec<PlayerId> },
    Effect(EffectRequest),
}

/// Generates `serialize_state`, `apply_state` and `round_state` for a mode
/// whose replicated projection lives in a `state: $StateType` field with a
/// `round: RoundState` member.
#[macro_export]
macro_rules! mode_state_boilerplate {
    (mode: $mode:expr, state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            match $crate::net::protocol::encode_snapshot($mode, &self.state) {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode mode snapshot");
                    Vec::new()
                },
            }
        }

        fn apply_state(
            &mut self,
            state: &[u8],
        ) -> Result<(), $crate::net::protocol::ProtocolError> {
            self.state = $crate::net::protocol::decode_snapshot::<$StateType>($mode, state)?;
            Ok(())
        }

        fn round_state(&self) -> $crate::round::RoundState {
            self.state.round
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_config_reads_numeric_overrides() {
        let mut config = RoundConfig::default();
        config
            .custom
            .insert("countdown_secs".to_string(), serde_json::json!(1.5));
        config
            .custom
            .insert("seed".to_string(), serde_json::json!(42));
        assert_eq!(config.f32_override("countdown_secs"), Some(1.5));
        assert_eq!(config.u64_override("seed"), Some(42));
        assert_eq!(config.u64_override("missing"), None);
    }

    #[test]
    fn non_numeric_override_is_ignored() {
        let mut config = RoundConfig::default();
        config
            .custom
            .insert("countdown_secs".to_string(), serde_json::json!("soon"));
        assert_eq!(config.f32_override("countdown_secs"), None);
    }
}
