use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tagparty_core::authority::{Authority, ModeHandle};
use tagparty_core::effects::{EffectDispatcher, dispatch_events};
use tagparty_core::mode_registry::ModeId;
use tagparty_core::mode_trait::{ModeEvent, PlayerId, RoundConfig};
use tagparty_core::player::Player;
use tagparty_core::round::RoundState;

use crate::error::HostError;
use crate::registry::ModeRegistry;

/// Commands sent from the room to the authoritative tick loop.
#[derive(Debug)]
pub enum SessionCommand {
    PlayerJoined { player: Player },
    PlayerLeft { player_id: PlayerId },
    TagReported { tagger: PlayerId, tagged: PlayerId },
    Stop,
}

/// Broadcasts sent from the tick loop to every peer.
#[derive(Debug, Clone)]
pub enum SessionBroadcast {
    /// Encoded mode snapshot. `tick` increases with every snapshot sent,
    /// including out-of-band ones after a join.
    Snapshot { tick: u32, data: Bytes },
    Phase { from: RoundState, to: RoundState },
    RoundComplete { winners: Vec<PlayerId> },
    /// The loop has exited.
    Ended,
}

/// Configuration for a session spawned by the host.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: ModeId,
    pub players: Vec<Player>,
    pub custom: HashMap<String, serde_json::Value>,
    /// Overrides the mode's tick rate when set.
    pub tick_rate_hz: Option<f32>,
}

impl SessionConfig {
    pub fn new(mode: ModeId, players: Vec<Player>) -> Self {
        Self {
            mode,
            players,
            custom: HashMap::new(),
            tick_rate_hz: None,
        }
    }
}

pub type SessionChannels = (
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionBroadcast>,
    JoinHandle<()>,
);

/// Spawn an authoritative tick loop as a tokio task.
/// Returns the command sender, the broadcast receiver and the task handle.
pub fn spawn_session(
    registry: &ModeRegistry,
    config: SessionConfig,
    dispatcher: Box<dyn EffectDispatcher>,
) -> Result<SessionChannels, HostError> {
    let mode = registry.create(config.mode)?;
    let handle = ModeHandle::new(mode, Authority::Authoritative);

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        let mut session = Session {
            handle,
            dispatcher,
            broadcast_tx,
            tick: 0,
        };
        session.run(config, cmd_rx).await;
    });

    Ok((cmd_tx, broadcast_rx, task))
}

struct Session {
    handle: ModeHandle,
    dispatcher: Box<dyn EffectDispatcher>,
    broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>,
    tick: u32,
}

impl Session {
    async fn run(&mut self, config: SessionConfig, mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>) {
        let round_config = RoundConfig {
            custom: config.custom.clone(),
        };
        self.handle.start_playing(&config.players, &round_config);
        let mut players = config.players;

        let tick_rate = config
            .tick_rate_hz
            .unwrap_or_else(|| self.handle.mode().tick_rate());
        let tick_rate = if tick_rate.is_finite() && tick_rate > 0.0 {
            tick_rate
        } else {
            tracing::warn!(tick_rate, "Invalid tick rate, falling back to 10 Hz");
            10.0
        };
        let dt = 1.0 / tick_rate;
        let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            mode = %config.mode,
            room = config.mode.label(),
            players = players.len(),
            tick_rate,
            "Session started"
        );
        self.broadcast_snapshot();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let events = self.handle.tick(dt);
                    self.deliver(&events);
                    self.broadcast_snapshot();
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::PlayerJoined { player }) => {
                            tracing::info!(player_id = player.id, "Player joined session");
                            let events = self.handle.player_joined(&player);
                            if !players.iter().any(|p| p.id == player.id) {
                                players.push(player);
                            }
                            self.deliver(&events);
                            // The joiner needs the current projection right away.
                            self.broadcast_snapshot();
                        },
                        Some(SessionCommand::PlayerLeft { player_id }) => {
                            tracing::info!(player_id, "Player left session");
                            let events = self.handle.player_left(player_id);
                            players.retain(|p| p.id != player_id);
                            self.deliver(&events);
                            if players.is_empty() {
                                break;
                            }
                            self.broadcast_snapshot();
                        },
                        Some(SessionCommand::TagReported { tagger, tagged }) => {
                            let events = self.handle.report_tag(tagger, tagged);
                            self.deliver(&events);
                        },
                        Some(SessionCommand::Stop) | None => break,
                    }
                }
            }
        }

        self.handle.stop_playing();
        tracing::info!(mode = %config.mode, ticks = self.tick, "Session ended");
        let _ = self.broadcast_tx.send(SessionBroadcast::Ended);
    }

    /// Route effects to the dispatcher and lifecycle events to peers.
    fn deliver(&mut self, events: &[ModeEvent]) {
        dispatch_events(events, &mut *self.dispatcher);
        for event in events {
            match event {
                ModeEvent::PhaseChanged { from, to } => {
                    let _ = self.broadcast_tx.send(SessionBroadcast::Phase {
                        from: *from,
                        to: *to,
                    });
                },
                ModeEvent::RoundComplete { winners } => {
                    tracing::info!(?winners, "Round complete");
                    let _ = self.broadcast_tx.send(SessionBroadcast::RoundComplete {
                        winners: winners.clone(),
                    });
                },
                ModeEvent::TagAccepted { tagger, tagged } => {
                    tracing::debug!(tagger, tagged, "Tag accepted");
                },
                ModeEvent::RolesAssigned | ModeEvent::Effect(_) => {},
            }
        }
    }

    fn broadcast_snapshot(&mut self) {
        let Some(data) = self.handle.write_snapshot() else {
            tracing::error!(tick = self.tick, "Mode produced no snapshot");
            return;
        };
        self.tick = self.tick.wrapping_add(1);
        let _ = self.broadcast_tx.send(SessionBroadcast::Snapshot {
            tick: self.tick,
            data: Bytes::from(data),
        });
    }
}
