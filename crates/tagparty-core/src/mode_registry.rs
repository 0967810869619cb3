use serde::{Deserialize, Serialize};

/// Identifier for a registered game mode. The byte value prefixes every
/// replicated snapshot of that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModeId {
    TeamInfection = 1,
    TeamTag = 2,
    HotPotato = 3,
}

impl ModeId {
    pub const ALL: [ModeId; 3] = [Self::TeamInfection, Self::TeamTag, Self::HotPotato];

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::TeamInfection),
            2 => Some(Self::TeamTag),
            3 => Some(Self::HotPotato),
            _ => None,
        }
    }

    /// Stable identifier used in config files and room properties.
    pub fn guid(self) -> &'static str {
        match self {
            Self::TeamInfection => "team_infection",
            Self::TeamTag => "team_tag",
            Self::HotPotato => "hot_potato",
        }
    }

    /// Label shown in the room's mode field.
    pub fn label(self) -> &'static str {
        match self {
            Self::TeamInfection => "TEAM INFECTION",
            Self::TeamTag => "TEAM TAG",
            Self::HotPotato => "HOT POTATO",
        }
    }
}

impl std::fmt::Display for ModeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.guid())
    }
}

impl std::str::FromStr for ModeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|id| id.guid() == normalized)
            .ok_or_else(|| format!("unknown game mode: {s}"))
    }
}
