pub mod config;
pub mod error;
pub mod peer;
pub mod registry;
pub mod session;
pub mod sim;

pub use config::{ConfigSource, HostConfig, LogFormat};
pub use error::HostError;
pub use peer::ReplicaPeer;
pub use registry::ModeRegistry;
pub use session::{SessionBroadcast, SessionCommand, SessionConfig, spawn_session};
