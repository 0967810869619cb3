use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use tagparty_core::effects::EffectDispatcher;
use tagparty_core::mode_trait::PlayerId;
use tagparty_core::player::Player;

use crate::config::HostConfig;
use crate::error::HostError;
use crate::peer::ReplicaPeer;
use crate::registry::ModeRegistry;
use crate::session::{SessionBroadcast, SessionCommand, spawn_session};

/// Create `n` simulated players with ids starting at 1.
pub fn make_bots(n: usize) -> Vec<Player> {
    (1..=n)
        .map(|i| Player::new(i as PlayerId, format!("Bot{i}")))
        .collect()
}

/// Pick a random tag the projection currently allows between two bots.
pub fn choose_tag(
    peer: &ReplicaPeer,
    bots: &[PlayerId],
    rng: &mut StdRng,
) -> Option<(PlayerId, PlayerId)> {
    let pairs: Vec<(PlayerId, PlayerId)> = bots
        .iter()
        .flat_map(|&a| bots.iter().map(move |&b| (a, b)))
        .filter(|&(a, b)| a != b && peer.can_tag(a, b))
        .collect();
    pairs.choose(rng).copied()
}

/// What a simulation run observed from the replica side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimReport {
    /// Label the room advertises for the simulated mode.
    pub room_label: &'static str,
    pub snapshots_applied: u64,
    pub tags_reported: u64,
    pub phase_changes: u64,
    pub rounds_completed: u64,
}

/// Run a headless session: bots report tags chosen from a replica's view
/// until the configured duration elapses.
pub async fn run_simulation(
    registry: &ModeRegistry,
    config: &HostConfig,
    dispatcher: Box<dyn EffectDispatcher>,
) -> Result<SimReport, HostError> {
    config.validate()?;
    let session = config.session_config()?;
    let bots: Vec<PlayerId> = session.players.iter().map(|p| p.id).collect();
    let session_mode = session.mode;
    let mut peer = ReplicaPeer::from_registry(registry, session_mode)?;
    let (cmd_tx, mut rx, task) = spawn_session(registry, session, dispatcher)?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    };
    let mut tag_timer = tokio::time::interval(config.tag_interval());
    tag_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let deadline = tokio::time::sleep(config.duration());
    tokio::pin!(deadline);

    let mut report = SimReport {
        room_label: session_mode.label(),
        ..SimReport::default()
    };
    let mut stopping = false;

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                match &msg {
                    SessionBroadcast::Ended => break,
                    SessionBroadcast::Phase { from, to } => {
                        tracing::info!(%from, %to, "Round phase");
                        report.phase_changes += 1;
                    },
                    SessionBroadcast::RoundComplete { winners } => {
                        tracing::info!(?winners, "Round won");
                        report.rounds_completed += 1;
                    },
                    SessionBroadcast::Snapshot { .. } => {},
                }
                if let Err(e) = peer.apply(&msg) {
                    tracing::warn!(error = %e, "Replica could not apply broadcast");
                }
            }
            _ = tag_timer.tick(), if !stopping => {
                if let Some((tagger, tagged)) = choose_tag(&peer, &bots, &mut rng) {
                    tracing::debug!(tagger, tagged, "Bot reporting tag");
                    if cmd_tx.send(SessionCommand::TagReported { tagger, tagged }).is_err() {
                        break;
                    }
                    report.tags_reported += 1;
                }
            }
            _ = &mut deadline, if !stopping => {
                tracing::info!("Simulation time elapsed, stopping session");
                stopping = true;
                let _ = cmd_tx.send(SessionCommand::Stop);
            }
        }
    }

    let _ = task.await;
    report.snapshots_applied = peer.applied();
    tracing::info!(
        snapshots = report.snapshots_applied,
        tags = report.tags_reported,
        rounds = report.rounds_completed,
        room = report.room_label,
        "Simulation finished"
    );
    Ok(report)
}
