pub mod config;

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use tagparty_core::effects::{EffectRequest, SoundTarget};
use tagparty_core::mode_registry::ModeId;
use tagparty_core::mode_state_boilerplate;
use tagparty_core::mode_trait::{
    GameMode, ModeEvent, ModeMetadata, PlayerId, RoundConfig,
};
use tagparty_core::player::Player;
use tagparty_core::rng::round_rng;
use tagparty_core::round::{RoundMachine, RoundState, RoundTransition};
use tagparty_core::team::{self, Team, TeamOutcome, TeamSnapshot};

use config::TeamTagConfig;

/// Team Tag: the room is split evenly into Red and Blue, and a tag pulls
/// the target across. Converted players are briefly immune.
pub struct TeamTag {
    state: TeamSnapshot,
    machine: RoundMachine,
    /// Remaining immunity per freshly converted player. Authority only.
    grace: BTreeMap<PlayerId, f32>,
    rng: StdRng,
    base_config: TeamTagConfig,
    config: TeamTagConfig,
}

impl TeamTag {
    pub fn new() -> Self {
        Self::with_config(TeamTagConfig::load())
    }

    pub fn with_config(config: TeamTagConfig) -> Self {
        let config = config.sanitized();
        Self {
            state: TeamSnapshot::default(),
            machine: RoundMachine::new(config.rules()),
            grace: BTreeMap::new(),
            rng: round_rng(config.seed),
            base_config: config.clone(),
            config,
        }
    }

    pub fn state(&self) -> &TeamSnapshot {
        &self.state
    }

    pub fn team_of(&self, player_id: PlayerId) -> Team {
        team::team_of(&self.state.teams, player_id)
    }

    pub fn team_count(&self, team: Team) -> usize {
        team::team_count(&self.state.teams, team)
    }

    /// Whether `player_id` was converted too recently to be tagged.
    pub fn is_immune(&self, player_id: PlayerId) -> bool {
        self.grace.contains_key(&player_id)
    }

    /// The team a mid-round joiner lands on. Ties go to Red.
    fn smaller_team(&self) -> Team {
        if self.team_count(Team::Blue) < self.team_count(Team::Red) {
            Team::Blue
        } else {
            Team::Red
        }
    }

    fn assign_teams(&mut self) {
        let mut ids: Vec<PlayerId> = self.state.teams.keys().copied().collect();
        ids.shuffle(&mut self.rng);
        for (i, id) in ids.into_iter().enumerate() {
            let team = if i % 2 == 0 { Team::Red } else { Team::Blue };
            tracing::debug!(player_id = id, %team, "Assigning team");
            self.state.teams.insert(id, team);
        }
        tracing::info!(
            red = self.team_count(Team::Red),
            blue = self.team_count(Team::Blue),
            "Teams balanced"
        );
    }

    fn reset_teams(&mut self) {
        for team in self.state.teams.values_mut() {
            *team = Team::Teamless;
        }
        self.grace.clear();
    }

    fn tick_grace(&mut self, dt: f32) {
        self.grace.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
    }

    fn check_status(&mut self) -> Vec<ModeEvent> {
        if !self.state.round.is_playing() {
            return Vec::new();
        }
        let TeamOutcome::Won(winner) = team::evaluate(&self.state.teams) else {
            // An all-teamless room is left for the round machine to resolve.
            return Vec::new();
        };
        tracing::info!(team = %winner, "Team holds every player, round complete");
        let winners = team::members(&self.state.teams, winner);
        let from = self.state.round;
        let mut events = Vec::new();
        if self.machine.complete(&mut self.state.round) {
            events.push(ModeEvent::PhaseChanged {
                from,
                to: self.state.round,
            });
            events.push(ModeEvent::RoundComplete { winners });
        }
        events
    }
}

impl Default for TeamTag {
    fn default() -> Self {
        Self::with_config(TeamTagConfig::default())
    }
}

impl GameMode for TeamTag {
    fn metadata(&self) -> ModeMetadata {
        ModeMetadata {
            id: ModeId::TeamTag,
            name: "Team Tag".to_string(),
            description: "Red versus Blue. Tag the other side to bring them over.".to_string(),
            min_players: self.config.min_players as u8,
            max_players: 10,
        }
    }

    fn start_playing(&mut self, players: &[Player], config: &RoundConfig) {
        self.config = self.base_config.with_overrides(config);
        self.machine = RoundMachine::new(self.config.rules());
        self.rng = round_rng(self.config.seed);
        self.grace.clear();
        self.state = TeamSnapshot::default();
        for player in players {
            self.state.teams.insert(player.id, Team::Teamless);
        }
        tracing::info!(players = players.len(), "Team tag started");
    }

    fn stop_playing(&mut self) {
        self.machine.reset(&mut self.state.round);
        self.state.teams.clear();
        self.grace.clear();
    }

    fn update(&mut self, dt: f32) -> Vec<ModeEvent> {
        self.tick_grace(dt);

        let from = self.state.round;
        let player_count = self.state.teams.len();
        let Some(transition) = self.machine.advance(&mut self.state.round, dt, player_count)
        else {
            return Vec::new();
        };
        let to = self.state.round;
        tracing::info!(%from, %to, "Team tag round state changed");

        let mut events = vec![ModeEvent::PhaseChanged { from, to }];
        match transition {
            RoundTransition::Started => {
                self.assign_teams();
                events.push(ModeEvent::RolesAssigned);
            },
            RoundTransition::Aborted | RoundTransition::Restarting => self.reset_teams(),
            RoundTransition::CountdownStarted => {},
        }
        events
    }

    fn player_joined(&mut self, player: &Player) -> Vec<ModeEvent> {
        if self.state.teams.contains_key(&player.id) {
            return Vec::new();
        }
        let team = if self.state.round.is_playing() {
            self.smaller_team()
        } else {
            Team::Teamless
        };
        tracing::debug!(player_id = player.id, %team, "Player joined");
        self.state.teams.insert(player.id, team);
        Vec::new()
    }

    fn player_left(&mut self, player_id: PlayerId) -> Vec<ModeEvent> {
        self.grace.remove(&player_id);
        if self.state.teams.remove(&player_id).is_none() {
            return Vec::new();
        }
        tracing::debug!(player_id, "Player left, team entry removed");
        self.check_status()
    }

    fn can_tag(&self, tagger: PlayerId, tagged: PlayerId) -> bool {
        if tagger == tagged || self.is_immune(tagged) {
            return false;
        }
        let (Some(&mine), Some(&theirs)) =
            (self.state.teams.get(&tagger), self.state.teams.get(&tagged))
        else {
            return false;
        };
        theirs != Team::Teamless && team::opposing(mine, theirs)
    }

    fn report_tag(&mut self, tagger: PlayerId, tagged: PlayerId) -> Vec<ModeEvent> {
        if !self.state.round.is_playing() || !self.can_tag(tagger, tagged) {
            tracing::debug!(tagger, tagged, "Tag rejected");
            return Vec::new();
        }

        let team = self.team_of(tagger);
        self.state.teams.insert(tagged, team);
        if self.config.convert_grace_secs > 0.0 {
            self.grace.insert(tagged, self.config.convert_grace_secs);
        }
        tracing::info!(tagger, tagged, %team, "Player converted");

        let mut events = vec![ModeEvent::TagAccepted { tagger, tagged }];
        if let Some(cue) = self.config.tag_sound {
            events.push(ModeEvent::Effect(EffectRequest::sound(
                cue,
                SoundTarget::Player(tagged),
            )));
        }
        events.extend(self.check_status());
        events
    }

    fn material_index(&self, player_id: PlayerId) -> u8 {
        self.team_of(player_id).material_index()
    }

    mode_state_boilerplate!(mode: ModeId::TeamTag, state_type: TeamSnapshot);

    fn promote(&mut self, players: &[Player]) {
        self.machine = RoundMachine::new(self.config.rules());
        self.grace.clear();
        self.state
            .teams
            .retain(|id, _| players.iter().any(|p| p.id == *id));
        let playing = self.state.round.is_playing();
        for player in players {
            if self.state.teams.contains_key(&player.id) {
                continue;
            }
            let team = if playing {
                self.smaller_team()
            } else {
                Team::Teamless
            };
            self.state.teams.insert(player.id, team);
        }
    }
}
