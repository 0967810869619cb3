use serde::{Deserialize, Serialize};

use crate::net::protocol::InvalidByte;

/// Round lifecycle shared by every mode. Travels on the wire as one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum RoundState {
    #[default]
    Waiting = 0,
    Countdown = 1,
    Playing = 2,
    Complete = 3,
}

impl RoundState {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Waiting),
            1 => Some(Self::Countdown),
            2 => Some(Self::Playing),
            3 => Some(Self::Complete),
            _ => None,
        }
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

impl From<RoundState> for u8 {
    fn from(state: RoundState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for RoundState {
    type Error = InvalidByte;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_byte(value).ok_or(InvalidByte {
            kind: "round state",
            value,
        })
    }
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Countdown => "countdown",
            Self::Playing => "playing",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Thresholds that drive the round machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRules {
    pub min_players: usize,
    pub countdown_secs: f32,
}

/// What a call to [`RoundMachine::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTransition {
    /// Waiting -> Countdown.
    CountdownStarted,
    /// Countdown -> Playing. The mode assigns roles now.
    Started,
    /// Countdown or Playing -> Waiting because the room dropped below the minimum.
    Aborted,
    /// Complete -> Countdown. The mode resets roles to neutral now.
    Restarting,
}

/// Authority-only timer state for the round lifecycle.
///
/// The current [`RoundState`] itself lives in each mode's replicated
/// projection, so the machine operates on it by reference.
#[derive(Debug, Clone)]
pub struct RoundMachine {
    rules: RoundRules,
    countdown_remaining: f32,
}

impl RoundMachine {
    pub fn new(rules: RoundRules) -> Self {
        Self {
            rules,
            countdown_remaining: rules.countdown_secs,
        }
    }

    pub fn countdown_remaining(&self) -> f32 {
        self.countdown_remaining
    }

    /// Advance the machine by one authority tick.
    pub fn advance(
        &mut self,
        state: &mut RoundState,
        dt: f32,
        player_count: usize,
    ) -> Option<RoundTransition> {
        let enough = player_count >= self.rules.min_players;
        match *state {
            RoundState::Waiting => {
                if !enough {
                    return None;
                }
                self.countdown_remaining = self.rules.countdown_secs;
                *state = RoundState::Countdown;
                Some(RoundTransition::CountdownStarted)
            },
            RoundState::Countdown => {
                if !enough {
                    *state = RoundState::Waiting;
                    return Some(RoundTransition::Aborted);
                }
                self.countdown_remaining -= dt;
                if self.countdown_remaining > 0.0 {
                    return None;
                }
                self.countdown_remaining = 0.0;
                *state = RoundState::Playing;
                Some(RoundTransition::Started)
            },
            RoundState::Playing => {
                if enough {
                    return None;
                }
                *state = RoundState::Waiting;
                Some(RoundTransition::Aborted)
            },
            RoundState::Complete => {
                self.countdown_remaining = self.rules.countdown_secs;
                *state = RoundState::Countdown;
                Some(RoundTransition::Restarting)
            },
        }
    }

    /// Mark the round won. Only valid while Playing.
    pub fn complete(&self, state: &mut RoundState) -> bool {
        if *state != RoundState::Playing {
            return false;
        }
        *state = RoundState::Complete;
        true
    }

    /// Put the machine back to its initial state.
    pub fn reset(&mut self, state: &mut RoundState) {
        *state = RoundState::Waiting;
        self.countdown_remaining = self.rules.countdown_secs;
    }
}
