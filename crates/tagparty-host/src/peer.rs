use tagparty_core::authority::{Authority, ModeHandle};
use tagparty_core::mode_registry::ModeId;
use tagparty_core::mode_trait::{GameMode, PlayerId};
use tagparty_core::player::Player;
use tagparty_core::round::RoundState;

use crate::error::HostError;
use crate::registry::ModeRegistry;
use crate::session::SessionBroadcast;

/// A non-authoritative peer rendering the projection it last received.
pub struct ReplicaPeer {
    handle: ModeHandle,
    last_tick: Option<u32>,
    applied: u64,
}

impl ReplicaPeer {
    pub fn new(mode: Box<dyn GameMode>) -> Self {
        Self {
            handle: ModeHandle::new(mode, Authority::Replica),
            last_tick: None,
            applied: 0,
        }
    }

    pub fn from_registry(registry: &ModeRegistry, mode: ModeId) -> Result<Self, HostError> {
        Ok(Self::new(registry.create(mode)?))
    }

    /// Apply a broadcast. Returns whether a snapshot was applied.
    ///
    /// Snapshots older than or equal to the last applied tick are dropped.
    /// A malformed snapshot leaves the previous projection in place.
    pub fn apply(&mut self, broadcast: &SessionBroadcast) -> Result<bool, HostError> {
        match broadcast {
            SessionBroadcast::Snapshot { tick, data } => self.apply_snapshot(*tick, data),
            SessionBroadcast::Ended => Err(HostError::SessionClosed),
            SessionBroadcast::Phase { .. } | SessionBroadcast::RoundComplete { .. } => Ok(false),
        }
    }

    pub fn apply_snapshot(&mut self, tick: u32, data: &[u8]) -> Result<bool, HostError> {
        if self.last_tick.is_some_and(|last| tick <= last) {
            tracing::debug!(tick, last = ?self.last_tick, "Dropping stale snapshot");
            return Ok(false);
        }
        if let Err(e) = self.handle.read_snapshot(data) {
            tracing::warn!(tick, error = %e, "Rejected snapshot");
            return Err(e.into());
        }
        self.last_tick = Some(tick);
        self.applied += 1;
        Ok(true)
    }

    pub fn last_tick(&self) -> Option<u32> {
        self.last_tick
    }

    /// Number of snapshots applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn round_state(&self) -> RoundState {
        self.handle.round_state()
    }

    pub fn material_index(&self, player_id: PlayerId) -> u8 {
        self.handle.material_index(player_id)
    }

    pub fn can_tag(&self, tagger: PlayerId, tagged: PlayerId) -> bool {
        self.handle.can_tag(tagger, tagged)
    }

    pub fn mode(&self) -> &dyn GameMode {
        self.handle.mode()
    }

    /// Take over as the authoritative peer from the last applied projection.
    pub fn promote(mut self, players: &[Player]) -> ModeHandle {
        self.handle.promote(players);
        self.handle
    }
}
