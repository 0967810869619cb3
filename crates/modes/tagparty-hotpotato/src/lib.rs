pub mod config;

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use tagparty_core::effects::{EffectRequest, SoundTarget, StatusEffect};
use tagparty_core::mode_registry::ModeId;
use tagparty_core::mode_state_boilerplate;
use tagparty_core::mode_trait::{
    GameMode, ModeEvent, ModeMetadata, PlayerId, RoundConfig,
};
use tagparty_core::player::Player;
use tagparty_core::rng::round_rng;
use tagparty_core::round::{RoundMachine, RoundState, RoundTransition};

use config::HotPotatoConfig;

/// Renderer material slots.
const MATERIAL_ALIVE: u8 = 0;
const MATERIAL_HOLDER: u8 = 1;
const MATERIAL_ELIMINATED: u8 = 2;

/// Replicated Hot Potato projection.
///
/// Wire order: round byte, holder (nil when nobody holds it), eliminated ids
/// in elimination order, then the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotPotatoState {
    pub round: RoundState,
    pub holder: Option<PlayerId>,
    pub eliminated: Vec<PlayerId>,
    pub players: BTreeSet<PlayerId>,
}

impl HotPotatoState {
    pub fn is_eliminated(&self, player_id: PlayerId) -> bool {
        self.eliminated.contains(&player_id)
    }

    pub fn is_holder(&self, player_id: PlayerId) -> bool {
        self.holder == Some(player_id)
    }

    /// Players still in the running, in id order.
    pub fn alive(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .copied()
            .filter(|id| !self.is_eliminated(*id))
            .collect()
    }
}

/// Hot Potato: one player holds a shrinking fuse. Pass it on with a tag
/// before it runs out, or be eliminated. Last player standing wins.
pub struct HotPotato {
    state: HotPotatoState,
    machine: RoundMachine,
    /// Seconds left on the current heat's fuse.
    fuse: f32,
    /// Fuse length of the next heat.
    next_fuse: f32,
    /// Total engine time seen by this authority, for slow cooldowns.
    elapsed: f64,
    /// Engine time of the last slow applied to each target.
    slow_cooldowns: BTreeMap<PlayerId, f64>,
    rng: StdRng,
    base_config: HotPotatoConfig,
    config: HotPotatoConfig,
}

impl HotPotato {
    pub fn new() -> Self {
        Self::with_config(HotPotatoConfig::load())
    }

    pub fn with_config(config: HotPotatoConfig) -> Self {
        let config = config.sanitized();
        Self {
            state: HotPotatoState::default(),
            machine: RoundMachine::new(config.rules()),
            fuse: config.max_potato_secs,
            next_fuse: config.max_potato_secs,
            elapsed: 0.0,
            slow_cooldowns: BTreeMap::new(),
            rng: round_rng(config.seed),
            base_config: config.clone(),
            config,
        }
    }

    pub fn state(&self) -> &HotPotatoState {
        &self.state
    }

    pub fn holder(&self) -> Option<PlayerId> {
        self.state.holder
    }

    pub fn fuse_remaining(&self) -> f32 {
        self.fuse
    }

    pub fn next_fuse(&self) -> f32 {
        self.next_fuse
    }

    fn reset_round_data(&mut self) {
        self.state.holder = None;
        self.state.eliminated.clear();
        self.slow_cooldowns.clear();
        self.next_fuse = self.config.max_potato_secs;
        self.fuse = self.next_fuse;
    }

    /// Hand the potato to a random survivor, or end the round when at most
    /// one is left.
    fn start_heat(&mut self) -> Vec<ModeEvent> {
        let alive = self.state.alive();
        if alive.len() <= 1 {
            self.state.holder = None;
            return self.complete(alive);
        }

        let holder = alive[self.rng.random_range(0..alive.len())];
        self.state.holder = Some(holder);
        self.fuse = self.next_fuse;
        self.next_fuse =
            (self.next_fuse - self.config.potato_decrease_secs).max(self.config.min_potato_secs);
        tracing::info!(
            holder,
            fuse = self.fuse,
            next_fuse = self.next_fuse,
            "New heat"
        );
        vec![ModeEvent::RolesAssigned]
    }

    fn complete(&mut self, winners: Vec<PlayerId>) -> Vec<ModeEvent> {
        let from = self.state.round;
        if !self.machine.complete(&mut self.state.round) {
            return Vec::new();
        }
        tracing::info!(?winners, "Hot potato round complete");
        vec![
            ModeEvent::PhaseChanged {
                from,
                to: self.state.round,
            },
            ModeEvent::RoundComplete { winners },
        ]
    }

    fn explode(&mut self) -> Vec<ModeEvent> {
        let mut events = Vec::new();
        if let Some(holder) = self.state.holder.take() {
            tracing::info!(player_id = holder, "Potato exploded");
            self.state.eliminated.push(holder);
            if let Some(cue) = self.config.explosion_sound {
                events.push(ModeEvent::Effect(EffectRequest::sound(cue, SoundTarget::All)));
            }
        }
        events.extend(self.start_heat());
        events
    }

    /// Runs after a disconnect that did not take the potato with it.
    fn check_survivors(&mut self) -> Vec<ModeEvent> {
        if !self.state.round.is_playing() {
            return Vec::new();
        }
        let alive = self.state.alive();
        if alive.len() <= 1 {
            self.state.holder = None;
            return self.complete(alive);
        }
        Vec::new()
    }

    fn tick_fuse(&mut self, dt: f32) -> Vec<ModeEvent> {
        if self.state.holder.is_none() {
            return self.start_heat();
        }
        self.fuse -= dt;
        if self.fuse <= 0.0 {
            return self.explode();
        }
        Vec::new()
    }

    fn try_slow(&mut self, tagged: PlayerId) -> Option<ModeEvent> {
        if let Some(&last) = self.slow_cooldowns.get(&tagged)
            && self.elapsed < last + f64::from(self.config.slow_cooldown_secs)
        {
            tracing::debug!(player_id = tagged, "Slow still on cooldown");
            return None;
        }
        self.slow_cooldowns.insert(tagged, self.elapsed);
        Some(ModeEvent::Effect(EffectRequest::Status {
            effect: StatusEffect::SetSlowedTime,
            target: tagged,
        }))
    }
}

impl Default for HotPotato {
    fn default() -> Self {
        Self::with_config(HotPotatoConfig::default())
    }
}

impl GameMode for HotPotato {
    fn metadata(&self) -> ModeMetadata {
        ModeMetadata {
            id: ModeId::HotPotato,
            name: "Hot Potato".to_string(),
            description: "Pass the potato before it explodes. Last one standing wins.".to_string(),
            min_players: self.config.min_players as u8,
            max_players: 10,
        }
    }

    fn start_playing(&mut self, players: &[Player], config: &RoundConfig) {
        self.config = self.base_config.with_overrides(config);
        self.machine = RoundMachine::new(self.config.rules());
        self.rng = round_rng(self.config.seed);
        self.elapsed = 0.0;
        self.state = HotPotatoState {
            players: players.iter().map(|p| p.id).collect(),
            ..HotPotatoState::default()
        };
        self.reset_round_data();
        tracing::info!(players = players.len(), "Hot potato started");
    }

    fn stop_playing(&mut self) {
        self.machine.reset(&mut self.state.round);
        self.reset_round_data();
        self.state.players.clear();
    }

    fn update(&mut self, dt: f32) -> Vec<ModeEvent> {
        self.elapsed += f64::from(dt);

        let from = self.state.round;
        let player_count = self.state.players.len();
        let Some(transition) = self.machine.advance(&mut self.state.round, dt, player_count)
        else {
            if self.state.round.is_playing() {
                return self.tick_fuse(dt);
            }
            return Vec::new();
        };
        let to = self.state.round;
        tracing::info!(%from, %to, "Hot potato round state changed");

        let mut events = vec![ModeEvent::PhaseChanged { from, to }];
        match transition {
            RoundTransition::Started => {
                self.reset_round_data();
                events.extend(self.start_heat());
            },
            RoundTransition::Aborted | RoundTransition::Restarting => self.reset_round_data(),
            RoundTransition::CountdownStarted => {},
        }
        events
    }

    fn player_joined(&mut self, player: &Player) -> Vec<ModeEvent> {
        if !self.state.players.insert(player.id) {
            return Vec::new();
        }
        if self.state.round.is_playing() {
            tracing::debug!(player_id = player.id, "Joined mid-round, eliminated");
            self.state.eliminated.push(player.id);
        }
        Vec::new()
    }

    fn player_left(&mut self, player_id: PlayerId) -> Vec<ModeEvent> {
        if !self.state.players.remove(&player_id) {
            return Vec::new();
        }
        self.state.eliminated.retain(|id| *id != player_id);
        self.slow_cooldowns.remove(&player_id);

        if self.state.is_holder(player_id) {
            tracing::info!(player_id, "Holder left, starting a new heat");
            self.state.holder = None;
            if self.state.round.is_playing() {
                return self.start_heat();
            }
            return Vec::new();
        }
        self.check_survivors()
    }

    fn can_tag(&self, tagger: PlayerId, tagged: PlayerId) -> bool {
        let state = &self.state;
        if tagger == tagged || !state.players.contains(&tagger) || !state.players.contains(&tagged)
        {
            return false;
        }
        if state.is_holder(tagger) {
            return !state.is_eliminated(tagged);
        }
        state.is_eliminated(tagger) && !state.is_eliminated(tagged) && !state.is_holder(tagged)
    }

    fn report_tag(&mut self, tagger: PlayerId, tagged: PlayerId) -> Vec<ModeEvent> {
        if !self.state.round.is_playing() || !self.can_tag(tagger, tagged) {
            tracing::debug!(tagger, tagged, "Tag rejected");
            return Vec::new();
        }

        let mut events = vec![ModeEvent::TagAccepted { tagger, tagged }];
        if self.state.is_holder(tagger) {
            self.state.holder = Some(tagged);
            self.fuse += self.config.pass_bonus_secs;
            tracing::info!(tagger, tagged, fuse = self.fuse, "Potato passed");
        } else {
            tracing::info!(tagger, tagged, "Eliminated player tagged a survivor");
            events.extend(self.try_slow(tagged));
        }
        events
    }

    fn material_index(&self, player_id: PlayerId) -> u8 {
        if self.state.is_eliminated(player_id) {
            MATERIAL_ELIMINATED
        } else if self.state.is_holder(player_id) {
            MATERIAL_HOLDER
        } else {
            MATERIAL_ALIVE
        }
    }

    mode_state_boilerplate!(mode: ModeId::HotPotato, state_type: HotPotatoState);

    fn promote(&mut self, players: &[Player]) {
        self.machine = RoundMachine::new(self.config.rules());
        self.slow_cooldowns.clear();
        self.fuse = self.config.max_potato_secs;
        self.next_fuse = self.config.max_potato_secs;

        let roster: BTreeSet<PlayerId> = players.iter().map(|p| p.id).collect();
        self.state.eliminated.retain(|id| roster.contains(id));
        if let Some(holder) = self.state.holder
            && !roster.contains(&holder)
        {
            // The next tick starts a fresh heat.
            self.state.holder = None;
        }
        let playing = self.state.round.is_playing();
        for &id in &roster {
            if !self.state.players.contains(&id) && playing {
                self.state.eliminated.push(id);
            }
        }
        self.state.players = roster;
        tracing::debug!(
            holder = ?self.state.holder,
            eliminated = self.state.eliminated.len(),
            "Rebuilt hot potato authority state"
        );
    }
}
