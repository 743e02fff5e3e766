/*!
# Shared Types and Utilities

Telemetry plumbing for the simulator to moving-map bridge: everything between
a raw simulator variable and a formatted X-Plane sentence.

## Core Types

- [`TelemetrySource`] - flat key -> float simulator link
- [`TelemetryVariable`] - a subscribed variable with range check and fallback
- [`AircraftVariables`] - the seven variables the bridge polls
- [`ProtocolSample`] - a sample converted to protocol units

## Modules

- [`source`] - telemetry source trait and variable names
- [`variables`] - registration and validated sampling
- [`units`] - unit conversion
- [`sentence`] - XGPS/XATT sentence formatting
- [`synthetic`] / [`replay`] - built-in sources
- [`error`] - common error types
*/

pub mod error;
pub mod replay;
pub mod sentence;
pub mod source;
pub mod synthetic;
pub mod units;
pub mod variables;

// Re-export commonly used types
pub use error::{BridgeError, Result};
pub use replay::ReplaySource;
pub use sentence::{attitude_sentence, position_sentence, SentenceKind};
pub use source::{SourceError, TelemetrySource, VariableHandle};
pub use synthetic::{OrbitParams, SyntheticSource};
pub use units::ProtocolSample;
pub use variables::{AircraftSample, AircraftVariables, TelemetryVariable, ValidRange};

/// Version information for the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol constants
pub mod protocol {
    /// UDP port X-Plane compatible receivers listen on
    pub const DEFAULT_PORT: u16 = 49002;

    /// Ticks per second; the attitude sentence rate
    pub const DEFAULT_UPDATE_RATE_HZ: u32 = 5;

    /// Position sentence prefix
    pub const POSITION_PREFIX: &str = "XGPS1";

    /// Attitude sentence prefix
    pub const ATTITUDE_PREFIX: &str = "XATT1";

    /// Decimals for latitude and longitude
    pub const COORDINATE_DECIMALS: u32 = 5;

    /// Decimals for altitude, heading and speed
    pub const VALUE_DECIMALS: u32 = 2;

    /// Decimals for heading, pitch and bank in the attitude sentence
    pub const ATTITUDE_DECIMALS: u32 = 2;
}
