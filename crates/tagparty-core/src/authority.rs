use crate::mode_trait::{GameMode, ModeEvent, PlayerId, RoundConfig};
use crate::net::protocol::ProtocolError;
use crate::player::Player;
use crate::round::RoundState;

/// Whether this peer owns the ground truth for the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Authoritative,
    Replica,
}

/// The single call boundary between the host and a [`GameMode`].
///
/// Mutating callbacks only reach the mode on the authoritative peer;
/// snapshots only reach it on replicas. Calls made on the wrong side are
/// dropped with a debug log rather than treated as errors.
pub struct ModeHandle {
    mode: Box<dyn GameMode>,
    authority: Authority,
}

impl ModeHandle {
    pub fn new(mode: Box<dyn GameMode>, authority: Authority) -> Self {
        Self { mode, authority }
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn is_authoritative(&self) -> bool {
        self.authority == Authority::Authoritative
    }

    pub fn mode(&self) -> &dyn GameMode {
        &*self.mode
    }

    fn require_authority(&self, op: &'static str) -> bool {
        if !self.is_authoritative() {
            tracing::debug!(op, "Not authoritative, skipping");
            return false;
        }
        true
    }

    pub fn start_playing(&mut self, players: &[Player], config: &RoundConfig) {
        if self.require_authority("start_playing") {
            self.mode.start_playing(players, config);
        }
    }

    /// Local cleanup when the mode is switched away from. Runs on every peer.
    pub fn stop_playing(&mut self) {
        self.mode.stop_playing();
    }

    pub fn tick(&mut self, dt: f32) -> Vec<ModeEvent> {
        if !self.require_authority("tick") {
            return Vec::new();
        }
        self.mode.update(dt)
    }

    pub fn player_joined(&mut self, player: &Player) -> Vec<ModeEvent> {
        if !self.require_authority("player_joined") {
            return Vec::new();
        }
        self.mode.player_joined(player)
    }

    pub fn player_left(&mut self, player_id: PlayerId) -> Vec<ModeEvent> {
        if !self.require_authority("player_left") {
            return Vec::new();
        }
        self.mode.player_left(player_id)
    }

    pub fn report_tag(&mut self, tagger: PlayerId, tagged: PlayerId) -> Vec<ModeEvent> {
        if !self.require_authority("report_tag") {
            return Vec::new();
        }
        self.mode.report_tag(tagger, tagged)
    }

    /// Snapshot for broadcast. Replicas have nothing to send.
    pub fn write_snapshot(&self) -> Option<Vec<u8>> {
        if !self.require_authority("write_snapshot") {
            return None;
        }
        let data = self.mode.serialize_state();
        (!data.is_empty()).then_some(data)
    }

    /// Overwrite the local projection. Ignored on the authoritative peer.
    pub fn read_snapshot(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        if self.is_authoritative() {
            tracing::debug!("Authoritative peer ignoring inbound snapshot");
            return Ok(());
        }
        self.mode.apply_state(data)
    }

    pub fn can_tag(&self, tagger: PlayerId, tagged: PlayerId) -> bool {
        self.mode.can_tag(tagger, tagged)
    }

    pub fn material_index(&self, player_id: PlayerId) -> u8 {
        self.mode.material_index(player_id)
    }

    pub fn round_state(&self) -> RoundState {
        self.mode.round_state()
    }

    /// Take over as the authoritative peer, continuing from the last projection.
    pub fn promote(&mut self, players: &[Player]) {
        if self.is_authoritative() {
            return;
        }
        tracing::info!(
            mode = %self.mode.metadata().id,
            players = players.len(),
            "Promoted to authoritative peer"
        );
        self.authority = Authority::Authoritative;
        self.mode.promote(players);
    }

    /// Hand authority to another peer. Local state becomes a projection again.
    pub fn demote(&mut self) {
        if self.is_authoritative() {
            tracing::info!(mode = %self.mode.metadata().id, "Demoted to replica");
        }
        self.authority = Authority::Replica;
    }
}
