/*!
Common error types for the flight simulator bridge.
*/

use std::net::SocketAddr;
use thiserror::Error;

/// Common result type used throughout the shared library
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Fatal errors: anything that reaches the scheduler as a `BridgeError`
/// stops the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Telemetry source errors surfaced at setup time
    #[error("Telemetry source error: {0}")]
    Source(#[from] crate::source::SourceError),

    /// A required simulation variable could not be resolved
    #[error("Simulation variable not found: {0}")]
    VariableNotFound(String),

    /// Could not open the telemetry source
    #[error("Failed to connect to telemetry source: {0}")]
    Connection(String),

    /// Socket creation or send failure
    #[error("Transport error sending to {destination}: {source}")]
    Transport {
        destination: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// I/O errors (socket setup, replay files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Replay record decoding errors
    #[error("Replay parse error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a transport error for a specific destination
    pub fn transport(destination: SocketAddr, source: std::io::Error) -> Self {
        Self::Transport { destination, source }
    }
}
