/*!
Telemetry source abstraction.

A source exposes a flat key -> float variable space. Names are resolved to
handles once at startup and read by handle on every tick.
*/

use thiserror::Error;

/// Simulation variable names as published by the simulator.
///
/// Heading, pitch and bank are reported in radians despite their names.
pub mod simvars {
    pub const PLANE_LATITUDE: &str = "PLANE_LATITUDE";
    pub const PLANE_LONGITUDE: &str = "PLANE_LONGITUDE";
    pub const PLANE_ALTITUDE: &str = "PLANE_ALTITUDE";
    pub const PLANE_HEADING_DEGREES_TRUE: &str = "PLANE_HEADING_DEGREES_TRUE";
    pub const GROUND_VELOCITY: &str = "GROUND_VELOCITY";
    pub const PLANE_PITCH_DEGREES: &str = "PLANE_PITCH_DEGREES";
    pub const PLANE_BANK_DEGREES: &str = "PLANE_BANK_DEGREES";

    /// Every variable the bridge subscribes to, in registration order
    pub const ALL: [&str; 7] = [
        PLANE_LATITUDE,
        PLANE_LONGITUDE,
        PLANE_ALTITUDE,
        PLANE_HEADING_DEGREES_TRUE,
        GROUND_VELOCITY,
        PLANE_PITCH_DEGREES,
        PLANE_BANK_DEGREES,
    ];
}

/// Opaque reference to a resolved source variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableHandle(pub usize);

/// Errors reported by a telemetry source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("unknown variable: {0}")]
    NotFound(String),

    #[error("value unavailable")]
    Unavailable,

    #[error("source disconnected")]
    Disconnected,
}

/// A live link to the simulator (or something pretending to be one)
pub trait TelemetrySource {
    /// Resolve a variable name into a handle usable with [`read`](Self::read)
    fn resolve(&mut self, name: &str) -> Result<VariableHandle, SourceError>;

    /// Read the current value of a resolved variable
    fn read(&mut self, handle: VariableHandle) -> Result<f64, SourceError>;

    /// Whether the link to the simulator is still up
    fn is_live(&self) -> bool;

    /// Release the link. Called exactly once by the scheduler.
    fn disconnect(&mut self);

    /// Move to the next sample. Called once at the start of every tick.
    fn advance(&mut self) {}
}

impl<S: TelemetrySource + ?Sized> TelemetrySource for Box<S> {
    fn resolve(&mut self, name: &str) -> Result<VariableHandle, SourceError> {
        (**self).resolve(name)
    }

    fn read(&mut self, handle: VariableHandle) -> Result<f64, SourceError> {
        (**self).read(handle)
    }

    fn is_live(&self) -> bool {
        (**self).is_live()
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }

    fn advance(&mut self) {
        (**self).advance()
    }
}
