//! Session tests: an authoritative tick loop feeding a replica peer through
//! the broadcast channel, the way a room would.

#[allow(dead_code)]
mod common;

use tagparty_core::effects::{EffectRequest, SoundCue, SoundTarget};
use tagparty_core::mode_registry::ModeId;
use tagparty_core::player::Player;
use tagparty_core::round::RoundState;
use tagparty_core::test_helpers::{RecordingDispatcher, make_players};
use tagparty_host::{
    ModeRegistry, ReplicaPeer, SessionBroadcast, SessionCommand, SessionConfig, spawn_session,
};

use common::{drain_until_ended, pump_until, with_material};

fn fast_session(mode: ModeId, players: usize) -> SessionConfig {
    let mut config = SessionConfig::new(mode, make_players(players));
    config.tick_rate_hz = Some(50.0);
    config
        .custom
        .insert("countdown_secs".to_string(), serde_json::json!(0.1));
    config
        .custom
        .insert("seed".to_string(), serde_json::json!(7));
    config
}

#[tokio::test]
async fn replica_follows_infection_round() {
    let registry = ModeRegistry::new();
    let (cmd_tx, mut rx, handle) = spawn_session(
        &registry,
        fast_session(ModeId::TeamInfection, 4),
        Box::new(RecordingDispatcher::default()),
    )
    .expect("should spawn");
    let mut peer = ReplicaPeer::from_registry(&registry, ModeId::TeamInfection).unwrap();

    let seen = pump_until(&mut rx, &mut peer, |p| p.round_state() == RoundState::Playing).await;
    assert!(seen.iter().any(|b| matches!(
        b,
        SessionBroadcast::Phase {
            from: RoundState::Countdown,
            to: RoundState::Playing
        }
    )));

    let ids = [1, 2, 3, 4];
    let red = with_material(&peer, &ids, 2);
    let blue = with_material(&peer, &ids, 3);
    assert_eq!(red.len(), 1, "exactly one red seed");
    assert_eq!(blue.len(), 1, "exactly one blue seed");
    assert_eq!(with_material(&peer, &ids, 0).len(), 2);

    // A tag reported to the authority shows up in the replica's projection
    let target = with_material(&peer, &ids, 0)[0];
    assert!(peer.can_tag(red[0], target));
    let _ = cmd_tx.send(SessionCommand::TagReported {
        tagger: red[0],
        tagged: target,
    });
    pump_until(&mut rx, &mut peer, |p| p.material_index(target) == 2).await;

    let _ = cmd_tx.send(SessionCommand::Stop);
    drain_until_ended(&mut rx).await;
    let _ = handle.await;
}

#[tokio::test]
async fn join_broadcasts_current_projection() {
    let registry = ModeRegistry::new();
    let (cmd_tx, mut rx, handle) = spawn_session(
        &registry,
        fast_session(ModeId::TeamTag, 3),
        Box::new(RecordingDispatcher::default()),
    )
    .expect("should spawn");
    let mut host_view = ReplicaPeer::from_registry(&registry, ModeId::TeamTag).unwrap();
    pump_until(&mut rx, &mut host_view, |p| p.round_state() == RoundState::Playing).await;

    // Red holds two of three players, so the joiner is placed on Blue
    let _ = cmd_tx.send(SessionCommand::PlayerJoined {
        player: Player::new(10, "Late"),
    });
    let mut joiner = ReplicaPeer::from_registry(&registry, ModeId::TeamTag).unwrap();
    pump_until(&mut rx, &mut joiner, |p| p.material_index(10) == 3).await;
    assert_eq!(joiner.round_state(), RoundState::Playing);
    assert_eq!(with_material(&joiner, &[1, 2, 3, 10], 2).len(), 2);

    let _ = cmd_tx.send(SessionCommand::Stop);
    drain_until_ended(&mut rx).await;
    let _ = handle.await;
}

#[tokio::test]
async fn snapshot_ticks_strictly_increase() {
    let registry = ModeRegistry::new();
    let (cmd_tx, mut rx, handle) = spawn_session(
        &registry,
        fast_session(ModeId::HotPotato, 3),
        Box::new(RecordingDispatcher::default()),
    )
    .expect("should spawn");

    let mut last = 0;
    let mut snapshots = 0;
    while snapshots < 10 {
        let msg = tokio::time::timeout(common::WAIT, rx.recv())
            .await
            .expect("broadcast within timeout")
            .expect("session alive");
        if let SessionBroadcast::Snapshot { tick, data } = msg {
            assert!(tick > last, "tick {tick} after {last}");
            assert_eq!(data[0], ModeId::HotPotato as u8);
            last = tick;
            snapshots += 1;
            if snapshots == 5 {
                let _ = cmd_tx.send(SessionCommand::PlayerJoined {
                    player: Player::new(20, "Mid"),
                });
            }
        }
    }

    let _ = cmd_tx.send(SessionCommand::Stop);
    drain_until_ended(&mut rx).await;
    let _ = handle.await;
}

#[tokio::test]
async fn explosion_sound_reaches_dispatcher() {
    let mut registry = ModeRegistry::new();
    registry.register(ModeId::HotPotato, || {
        Box::new(tagparty_hotpotato::HotPotato::with_config(
            tagparty_hotpotato::config::HotPotatoConfig {
                max_potato_secs: 0.3,
                min_potato_secs: 0.3,
                explosion_sound: Some(SoundCue { id: 5, volume: 0.9 }),
                ..Default::default()
            },
        ))
    });
    let dispatcher = RecordingDispatcher::default();
    let (cmd_tx, mut rx, handle) = spawn_session(
        &registry,
        fast_session(ModeId::HotPotato, 3),
        Box::new(dispatcher.clone()),
    )
    .expect("should spawn");
    let mut peer = ReplicaPeer::from_registry(&registry, ModeId::HotPotato).unwrap();

    // Someone renders as eliminated once the first fuse has burned down
    pump_until(&mut rx, &mut peer, |p| {
        !with_material(p, &[1, 2, 3], 2).is_empty()
    })
    .await;

    let requests = dispatcher.taken();
    assert!(requests.contains(&EffectRequest::Sound {
        sound_id: 5,
        volume: 0.9,
        target: SoundTarget::All,
        stop_current: false,
    }));

    let _ = cmd_tx.send(SessionCommand::Stop);
    drain_until_ended(&mut rx).await;
    let _ = handle.await;
}

#[tokio::test]
async fn leaving_player_vanishes_from_projection() {
    let registry = ModeRegistry::new();
    let (cmd_tx, mut rx, handle) = spawn_session(
        &registry,
        fast_session(ModeId::TeamInfection, 5),
        Box::new(RecordingDispatcher::default()),
    )
    .expect("should spawn");
    let mut peer = ReplicaPeer::from_registry(&registry, ModeId::TeamInfection).unwrap();
    pump_until(&mut rx, &mut peer, |p| p.round_state() == RoundState::Playing).await;

    let red = with_material(&peer, &[1, 2, 3, 4, 5], 2)[0];
    let _ = cmd_tx.send(SessionCommand::PlayerLeft { player_id: red });
    pump_until(&mut rx, &mut peer, |p| p.material_index(red) == 0).await;
    for other in [1, 2, 3, 4, 5] {
        assert!(!peer.can_tag(red, other));
        assert!(!peer.can_tag(other, red));
    }

    let _ = cmd_tx.send(SessionCommand::Stop);
    drain_until_ended(&mut rx).await;
    let _ = handle.await;
}
