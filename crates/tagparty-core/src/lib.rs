pub mod authority;
pub mod effects;
pub mod mode_registry;
pub mod mode_trait;
pub mod net;
pub mod player;
pub mod rng;
pub mod round;
pub mod team;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::sync::{Arc, Mutex};

    use crate::effects::{EffectDispatcher, EffectRequest, SoundTarget, StatusEffect};
    use crate::mode_registry::ModeId;
    use crate::mode_trait::{GameMode, ModeEvent, PlayerId, RoundConfig};
    use crate::player::Player;
    use crate::round::RoundState;

    /// Create `n` test players with sequential IDs starting at 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(i as PlayerId + 1, format!("Player{}", i + 1)))
            .collect()
    }

    /// Create a RoundConfig with a fixed seed and the given countdown.
    pub fn seeded_config(seed: u64, countdown_secs: f32) -> RoundConfig {
        let mut config = RoundConfig::default();
        config
            .custom
            .insert("seed".to_string(), serde_json::json!(seed));
        config.custom.insert(
            "countdown_secs".to_string(),
            serde_json::json!(countdown_secs),
        );
        config
    }

    /// Run N ticks, returning all accumulated events.
    pub fn run_ticks(mode: &mut dyn GameMode, n: usize, dt: f32) -> Vec<ModeEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(mode.update(dt));
        }
        all_events
    }

    /// Tick until the mode reports `target`, returning the events seen on the way.
    pub fn run_until(
        mode: &mut dyn GameMode,
        target: RoundState,
        max_ticks: usize,
        dt: f32,
    ) -> Vec<ModeEvent> {
        let mut all_events = Vec::new();
        for _ in 0..max_ticks {
            if mode.round_state() == target {
                return all_events;
            }
            all_events.extend(mode.update(dt));
        }
        assert_eq!(
            mode.round_state(),
            target,
            "mode did not reach {target} within {max_ticks} ticks"
        );
        all_events
    }

    /// Effect requests extracted from an event list.
    pub fn effects_in(events: &[ModeEvent]) -> Vec<EffectRequest> {
        events
            .iter()
            .filter_map(|e| match e {
                ModeEvent::Effect(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    /// Dispatcher that records every request for later inspection.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingDispatcher {
        pub requests: Arc<Mutex<Vec<EffectRequest>>>,
    }

    impl RecordingDispatcher {
        pub fn taken(&self) -> Vec<EffectRequest> {
            self.requests
                .lock()
                .map(|mut r| std::mem::take(&mut *r))
                .unwrap_or_default()
        }
    }

    impl EffectDispatcher for RecordingDispatcher {
        fn send_status(&mut self, effect: StatusEffect, target: PlayerId) {
            if let Ok(mut r) = self.requests.lock() {
                r.push(EffectRequest::Status { effect, target });
            }
        }

        fn send_sound(&mut self, sound_id: u32, volume: f32, target: SoundTarget, stop_current: bool) {
            if let Ok(mut r) = self.requests.lock() {
                r.push(EffectRequest::Sound {
                    sound_id,
                    volume,
                    target,
                    stop_current,
                });
            }
        }
    }

    // ================================================================
    // Game Mode Contract Tests
    // ================================================================
    // Every GameMode implementation must pass these. Mode crates call them
    // from their own #[cfg(test)] modules with a concrete instance.

    /// After start_playing() with enough players the round must eventually
    /// reach Playing and serialize a non-empty snapshot.
    pub fn contract_start_reaches_playing(
        mode: &mut dyn GameMode,
        player_count: usize,
        max_ticks: usize,
    ) {
        let players = make_players(player_count);
        mode.start_playing(&players, &seeded_config(7, 0.5));
        assert_eq!(mode.round_state(), RoundState::Waiting);
        run_until(mode, RoundState::Playing, max_ticks, 0.1);
        assert!(
            !mode.serialize_state().is_empty(),
            "serialize_state() must return non-empty bytes while playing"
        );
    }

    /// Encoding on the authority and decoding on a fresh replica must yield
    /// an identical projection (byte-identical re-encoding).
    pub fn contract_replica_roundtrip(authority: &dyn GameMode, replica: &mut dyn GameMode) {
        let data = authority.serialize_state();
        replica
            .apply_state(&data)
            .expect("replica must accept the authority's snapshot");
        assert_eq!(
            replica.serialize_state(),
            data,
            "replica projection must re-encode to the same bytes"
        );
        assert_eq!(replica.round_state(), authority.round_state());
    }

    /// A snapshot tagged for another mode must be rejected and leave the
    /// projection untouched.
    pub fn contract_rejects_foreign_snapshot(mode: &mut dyn GameMode, foreign: ModeId) {
        let before = mode.serialize_state();
        let mut data = before.clone();
        data[0] = foreign as u8;
        assert!(
            mode.apply_state(&data).is_err(),
            "snapshot tagged for {foreign} must be rejected"
        );
        assert!(mode.apply_state(&[]).is_err(), "empty snapshot must be rejected");
        assert_eq!(mode.serialize_state(), before, "rejected snapshot must not change state");
    }

    /// Nobody may tag themselves.
    pub fn contract_rejects_self_tag(mode: &dyn GameMode, player_ids: &[PlayerId]) {
        for &id in player_ids {
            assert!(!mode.can_tag(id, id), "player {id} must not be able to tag itself");
        }
    }

    /// After player_left() the id must be gone from every role lookup.
    pub fn contract_player_left_cleanup(
        mode: &mut dyn GameMode,
        player_id: PlayerId,
        others: &[PlayerId],
    ) {
        mode.player_left(player_id);
        assert_eq!(
            mode.material_index(player_id),
            0,
            "departed player must render with the neutral material"
        );
        for &other in others {
            assert!(!mode.can_tag(player_id, other), "departed player cannot tag");
            assert!(!mode.can_tag(other, player_id), "departed player cannot be tagged");
        }
        let events = mode.report_tag(player_id, others[0]);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ModeEvent::TagAccepted { .. })),
            "tags involving a departed player must be ignored"
        );
    }

    /// stop_playing() must drop everything back to Waiting.
    pub fn contract_stop_resets(mode: &mut dyn GameMode, player_ids: &[PlayerId]) {
        mode.stop_playing();
        assert_eq!(mode.round_state(), RoundState::Waiting);
        for &id in player_ids {
            assert_eq!(mode.material_index(id), 0, "player {id} must be neutral after stop");
        }
    }
}
