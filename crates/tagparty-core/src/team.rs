use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mode_trait::PlayerId;
use crate::net::protocol::InvalidByte;
use crate::round::RoundState;

/// Team label used by the two-team modes. Travels on the wire as one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Team {
    #[default]
    Teamless = 0,
    Red = 1,
    Blue = 2,
}

impl Team {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Teamless),
            1 => Some(Self::Red),
            2 => Some(Self::Blue),
            _ => None,
        }
    }

    /// Renderer material slot for this team.
    pub fn material_index(self) -> u8 {
        match self {
            Self::Teamless => 0,
            Self::Red => 2,
            Self::Blue => 3,
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        team as u8
    }
}

impl TryFrom<u8> for Team {
    type Error = InvalidByte;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_byte(value).ok_or(InvalidByte { kind: "team", value })
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Teamless => "teamless",
            Self::Red => "red",
            Self::Blue => "blue",
        };
        write!(f, "{s}")
    }
}

/// Replicated projection shared by the two-team modes.
///
/// Field order is the wire order: round state byte, then the team map
/// (count followed by `(id, team byte)` pairs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub round: RoundState,
    pub teams: BTreeMap<PlayerId, Team>,
}

/// Result of checking a team map for a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamOutcome {
    Undecided,
    Won(Team),
    AllTeamless,
}

/// Team of a player, defaulting to Teamless for unknown ids.
pub fn team_of(teams: &BTreeMap<PlayerId, Team>, player_id: PlayerId) -> Team {
    teams.get(&player_id).copied().unwrap_or_default()
}

pub fn team_count(teams: &BTreeMap<PlayerId, Team>, team: Team) -> usize {
    teams.values().filter(|t| **t == team).count()
}

/// Ids currently on `team`, in id order.
pub fn members(teams: &BTreeMap<PlayerId, Team>, team: Team) -> Vec<PlayerId> {
    teams
        .iter()
        .filter(|(_, t)| **t == team)
        .map(|(&id, _)| id)
        .collect()
}

/// Role predicate shared by the team modes: the tagger must be on a team and
/// the target must not be on the same one.
pub fn opposing(tagger: Team, tagged: Team) -> bool {
    tagger != Team::Teamless && tagger != tagged
}

/// Compare each team's head count against the number of connected players.
pub fn evaluate(teams: &BTreeMap<PlayerId, Team>) -> TeamOutcome {
    let total = teams.len();
    if total == 0 {
        return TeamOutcome::Undecided;
    }
    if team_count(teams, Team::Red) == total {
        TeamOutcome::Won(Team::Red)
    } else if team_count(teams, Team::Blue) == total {
        TeamOutcome::Won(Team::Blue)
    } else if team_count(teams, Team::Teamless) == total {
        TeamOutcome::AllTeamless
    } else {
        TeamOutcome::Undecided
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(PlayerId, Team)]) -> BTreeMap<PlayerId, Team> {
        entries.iter().copied().collect()
    }

    #[test]
    fn missing_player_defaults_to_teamless() {
        let teams = map(&[(1, Team::Red)]);
        assert_eq!(team_of(&teams, 1), Team::Red);
        assert_eq!(team_of(&teams, 99), Team::Teamless);
    }

    #[test]
    fn material_indices_match_renderer_slots() {
        assert_eq!(Team::Teamless.material_index(), 0);
        assert_eq!(Team::Red.material_index(), 2);
        assert_eq!(Team::Blue.material_index(), 3);
    }

    #[test]
    fn opposing_rejects_teamless_and_same_team() {
        assert!(!opposing(Team::Teamless, Team::Red));
        assert!(!opposing(Team::Red, Team::Red));
        assert!(!opposing(Team::Blue, Team::Blue));
        assert!(opposing(Team::Red, Team::Blue));
        assert!(opposing(Team::Blue, Team::Teamless));
    }

    #[test]
    fn evaluate_detects_each_outcome() {
        assert_eq!(evaluate(&BTreeMap::new()), TeamOutcome::Undecided);
        assert_eq!(
            evaluate(&map(&[(1, Team::Red), (2, Team::Red)])),
            TeamOutcome::Won(Team::Red)
        );
        assert_eq!(
            evaluate(&map(&[(1, Team::Blue)])),
            TeamOutcome::Won(Team::Blue)
        );
        assert_eq!(
            evaluate(&map(&[(1, Team::Teamless), (2, Team::Teamless)])),
            TeamOutcome::AllTeamless
        );
        assert_eq!(
            evaluate(&map(&[(1, Team::Red), (2, Team::Blue), (3, Team::Teamless)])),
            TeamOutcome::Undecided
        );
    }

    #[test]
    fn members_are_sorted_by_id() {
        let teams = map(&[(7, Team::Red), (3, Team::Red), (5, Team::Blue)]);
        assert_eq!(members(&teams, Team::Red), vec![3, 7]);
        assert_eq!(team_count(&teams, Team::Blue), 1);
    }
}
