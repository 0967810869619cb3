use serde::{Deserialize, Serialize};

use crate::mode_trait::PlayerId;

/// A participant connected to the room.
///
/// The id is stable for the lifetime of the connection and is never reused
/// while the player is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
}

impl Player {
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}
