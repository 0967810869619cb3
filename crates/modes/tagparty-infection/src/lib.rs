pub mod config;

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

use config::InfectionConfig;

/// Team Infection: one Red and one Blue seed, everyone else starts Teamless.
/// A tag pulls the target onto the tagger's team; the round ends when one
/// team has absorbed the whole room.
pub struct TeamInfection {
    state: TeamSnapshot,
    machine: RoundMachine,
    rng: StdRng,
    base_config: InfectionConfig,
    config: InfectionConfig,
}

impl TeamInfection {
    pub fn new() -> Self {
        Self::with_config(InfectionConfig::load())
    }

    /// Create a TeamInfection instance with explicit configuration.
    pub fn with_config(config: InfectionConfig) -> Self {
        let config = config.sanitized();
        Self {
            state: TeamSnapshot::default(),
            machine: RoundMachine::new(config.rules()),
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

    fn set_phase(&mut self, from: RoundState, events: &mut Vec<ModeEvent>) {
        let to = self.state.round;
        tracing::info!(%from, %to, "Team infection round state changed");
        events.push(ModeEvent::PhaseChanged { from, to });
    }

    /// Shuffle the room; the first player seeds Red, the second Blue.
    fn assign_teams(&mut self) {
        let mut ids: Vec<PlayerId> = self.state.teams.keys().copied().collect();
        ids.shuffle(&mut self.rng);
        for (i, id) in ids.into_iter().enumerate() {
            let team = match i {
                0 => Team::Red,
                1 => Team::Blue,
                _ => Team::Teamless,
            };
            tracing::debug!(player_id = id, %team, "Assigning team");
            self.state.teams.insert(id, team);
        }
    }

    fn reset_teams(&mut self) {
        for team in self.state.teams.values_mut() {
            *team = Team::Teamless;
        }
    }

    /// Runs after every accepted tag and every disconnect.
    fn check_status(&mut self) -> Vec<ModeEvent> {
        if !self.state.round.is_playing() {
            return Vec::new();
        }
        tracing::debug!(
            red = self.team_count(Team::Red),
            blue = self.team_count(Team::Blue),
            teamless = self.team_count(Team::Teamless),
            "Team counts"
        );
        let winners = match team::evaluate(&self.state.teams) {
            TeamOutcome::Undecided => return Vec::new(),
            TeamOutcome::Won(team) => {
                tracing::info!(%team, "Team has won, restarting round");
                team::members(&self.state.teams, team)
            },
            TeamOutcome::AllTeamless => {
                tracing::info!("Everyone is teamless, restarting round");
                Vec::new()
            },
        };
        let mut events = Vec::new();
        let from = self.state.round;
        if self.machine.complete(&mut self.state.round) {
            self.set_phase(from, &mut events);
            events.push(ModeEvent::RoundComplete { winners });
        }
        events
    }
}

impl Default for TeamInfection {
    fn default() -> Self {
        Self::with_config(InfectionConfig::default())
    }
}

impl GameMode for TeamInfection {
    fn metadata(&self) -> ModeMetadata {
        ModeMetadata {
            id: ModeId::TeamInfection,
            name: "Team Infection".to_string(),
            description: "Red and Blue each start with one player. Tag the teamless \
                          and the other team until yours holds the room."
                .to_string(),
            min_players: self.config.min_players as u8,
            max_players: 10,
        }
    }

    fn start_playing(&mut self, players: &[Player], config: &RoundConfig) {
        self.config = self.base_config.with_overrides(config);
        self.machine = RoundMachine::new(self.config.rules());
        self.rng = round_rng(self.config.seed);
        self.state = TeamSnapshot::default();
        for player in players {
            self.state.teams.insert(player.id, Team::Teamless);
        }
        tracing::info!(players = players.len(), "Team infection started");
    }

    fn stop_playing(&mut self) {
        self.machine.reset(&mut self.state.round);
        self.state.teams.clear();
    }

    fn update(&mut self, dt: f32) -> Vec<ModeEvent> {
        let from = self.state.round;
        let player_count = self.state.teams.len();
        let Some(transition) = self.machine.advance(&mut self.state.round, dt, player_count)
        else {
            return Vec::new();
        };

        let mut events = Vec::new();
        self.set_phase(from, &mut events);
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
        if !self.state.teams.contains_key(&player.id) {
            tracing::debug!(player_id = player.id, "Player had no team, assigning teamless");
            self.state.teams.insert(player.id, Team::Teamless);
        }
        Vec::new()
    }

    fn player_left(&mut self, player_id: PlayerId) -> Vec<ModeEvent> {
        if self.state.teams.remove(&player_id).is_none() {
            return Vec::new();
        }
        tracing::debug!(player_id, "Player left, team entry removed");
        self.check_status()
    }

    fn can_tag(&self, tagger: PlayerId, tagged: PlayerId) -> bool {
        if tagger == tagged
            || !self.state.teams.contains_key(&tagger)
            || !self.state.teams.contains_key(&tagged)
        {
            return false;
        }
        team::opposing(self.team_of(tagger), self.team_of(tagged))
    }

    fn report_tag(&mut self, tagger: PlayerId, tagged: PlayerId) -> Vec<ModeEvent> {
        if !self.state.round.is_playing() {
            tracing::debug!(tagger, tagged, "Tag outside of play ignored");
            return Vec::new();
        }
        if !self.can_tag(tagger, tagged) {
            tracing::debug!(tagger, tagged, "Tag rejected");
            return Vec::new();
        }

        let team = self.team_of(tagger);
        self.state.teams.insert(tagged, team);
        tracing::info!(tagger, tagged, %team, "Tag accepted");

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

    mode_state_boilerplate!(mode: ModeId::TeamInfection, state_type: TeamSnapshot);

    fn promote(&mut self, players: &[Player]) {
        self.machine = RoundMachine::new(self.config.rules());
        self.state
            .teams
            .retain(|id, _| players.iter().any(|p| p.id == *id));
        for player in players {
            self.state.teams.entry(player.id).or_insert(Team::Teamless);
        }
        tracing::debug!(
            players = players.len(),
            round = %self.state.round,
            "Rebuilt team infection authority state"
        );
    }
}
