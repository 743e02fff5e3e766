/*!
Variable registration and validated sampling.

Each [`TelemetryVariable`] carries its valid range and the last reading that
fell inside it. Live simulator feeds regularly produce junk values, so an
out-of-range or unavailable read falls back to the last good value instead
of failing the tick.
*/

use crate::error::{BridgeError, Result};
use crate::source::{simvars, SourceError, TelemetrySource, VariableHandle};
use tracing::{debug, info};

/// Inclusive bounds for a variable's accepted readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Accepted ranges, in simulator units
pub mod ranges {
    use super::ValidRange;
    use std::f64::consts::TAU;

    pub const LATITUDE: ValidRange = ValidRange::new(-90.0, 90.0);
    pub const LONGITUDE: ValidRange = ValidRange::new(-180.0, 180.0);
    /// Feet; the low end is the Dead Sea shore.
    pub const ALTITUDE: ValidRange = ValidRange::new(-1360.0, 99999.0);
    /// Radians
    pub const ANGLE: ValidRange = ValidRange::new(-TAU, TAU);
    /// Knots
    pub const GROUND_SPEED: ValidRange = ValidRange::new(0.0, 800.0);
}

/// A subscribed simulation variable with its fallback cache
#[derive(Debug, Clone)]
pub struct TelemetryVariable {
    name: String,
    handle: VariableHandle,
    range: ValidRange,
    last_good: f64,
    fallbacks: u64,
}

impl TelemetryVariable {
    /// Resolve `name` against the source. An unknown name is fatal.
    pub fn register<S: TelemetrySource + ?Sized>(
        source: &mut S,
        name: &str,
        range: ValidRange,
    ) -> Result<Self> {
        let handle = source.resolve(name).map_err(|e| match e {
            SourceError::NotFound(name) => BridgeError::VariableNotFound(name),
            other => BridgeError::Source(other),
        })?;

        debug!("Registered {} as {:?} (range {}..={})", name, handle, range.min, range.max);

        Ok(Self {
            name: name.to_string(),
            handle,
            range,
            last_good: 0.0,
            fallbacks: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> VariableHandle {
        self.handle
    }

    pub fn range(&self) -> ValidRange {
        self.range
    }

    /// Most recent valid reading (0 until one arrives)
    pub fn last_good(&self) -> f64 {
        self.last_good
    }

    /// Number of reads replaced by the cached value
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }

    /// Read a fresh value, falling back to the last good one.
    ///
    /// `last_good` is only ever overwritten by an in-range reading.
    pub fn read<S: TelemetrySource + ?Sized>(&mut self, source: &mut S) -> f64 {
        match source.read(self.handle) {
            Ok(value) if self.range.contains(value) => {
                self.last_good = value;
                value
            }
            Ok(value) => {
                self.fallbacks += 1;
                debug!("{} out of range ({}), using {}", self.name, value, self.last_good);
                self.last_good
            }
            Err(e) => {
                self.fallbacks += 1;
                debug!("{} read failed ({}), using {}", self.name, e, self.last_good);
                self.last_good
            }
        }
    }
}

/// One tick's worth of readings in simulator units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AircraftSample {
    /// Degrees
    pub latitude: f64,
    /// Degrees
    pub longitude: f64,
    /// Feet
    pub altitude_ft: f64,
    /// Radians, true
    pub heading_rad: f64,
    /// Knots
    pub ground_speed_kt: f64,
    /// Radians
    pub pitch_rad: f64,
    /// Radians
    pub bank_rad: f64,
}

/// The fixed set of variables the bridge polls
#[derive(Debug, Clone)]
pub struct AircraftVariables {
    pub latitude: TelemetryVariable,
    pub longitude: TelemetryVariable,
    pub altitude: TelemetryVariable,
    pub heading: TelemetryVariable,
    pub ground_speed: TelemetryVariable,
    pub pitch: TelemetryVariable,
    pub bank: TelemetryVariable,
}

impl AircraftVariables {
    /// Register every required variable, aborting on the first unknown name
    pub fn register<S: TelemetrySource + ?Sized>(source: &mut S) -> Result<Self> {
        let variables = Self {
            latitude: TelemetryVariable::register(source, simvars::PLANE_LATITUDE, ranges::LATITUDE)?,
            longitude: TelemetryVariable::register(source, simvars::PLANE_LONGITUDE, ranges::LONGITUDE)?,
            altitude: TelemetryVariable::register(source, simvars::PLANE_ALTITUDE, ranges::ALTITUDE)?,
            heading: TelemetryVariable::register(source, simvars::PLANE_HEADING_DEGREES_TRUE, ranges::ANGLE)?,
            ground_speed: TelemetryVariable::register(source, simvars::GROUND_VELOCITY, ranges::GROUND_SPEED)?,
            pitch: TelemetryVariable::register(source, simvars::PLANE_PITCH_DEGREES, ranges::ANGLE)?,
            bank: TelemetryVariable::register(source, simvars::PLANE_BANK_DEGREES, ranges::ANGLE)?,
        };

        info!("✅ Registered {} simulation variables", simvars::ALL.len());
        Ok(variables)
    }

    /// Read all seven variables through the fallback policy
    pub fn sample<S: TelemetrySource + ?Sized>(&mut self, source: &mut S) -> AircraftSample {
        AircraftSample {
            latitude: self.latitude.read(source),
            longitude: self.longitude.read(source),
            altitude_ft: self.altitude.read(source),
            heading_rad: self.heading.read(source),
            ground_speed_kt: self.ground_speed.read(source),
            pitch_rad: self.pitch.read(source),
            bank_rad: self.bank.read(source),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TelemetryVariable> {
        [
            &self.latitude,
            &self.longitude,
            &self.altitude,
            &self.heading,
            &self.ground_speed,
            &self.pitch,
            &self.bank,
        ]
        .into_iter()
    }

    /// Total fallbacks across all variables
    pub fn total_fallbacks(&self) -> u64 {
        self.iter().map(TelemetryVariable::fallbacks).sum()
    }
}
