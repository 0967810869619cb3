use tagparty_core::mode_registry::ModeId;
use tagparty_core::net::protocol::ProtocolError;

#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// The configured mode name does not parse.
    UnknownMode(String),
    /// The mode exists but its crate is not compiled in.
    ModeNotRegistered(ModeId),
    InvalidConfig(String),
    Protocol(ProtocolError),
    SessionClosed,
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMode(m) => write!(f, "unknown game mode: {m}"),
            Self::ModeNotRegistered(id) => write!(f, "game mode {id} is not compiled in"),
            Self::InvalidConfig(m) => write!(f, "invalid config: {m}"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::SessionClosed => write!(f, "session closed"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<ProtocolError> for HostError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            HostError::UnknownMode("freeze".to_string()).to_string(),
            "unknown game mode: freeze"
        );
        assert_eq!(
            HostError::ModeNotRegistered(ModeId::HotPotato).to_string(),
            "game mode hot_potato is not compiled in"
        );
        assert_eq!(
            HostError::from(ProtocolError::EmptyMessage).to_string(),
            "protocol error: empty message"
        );
    }
}
