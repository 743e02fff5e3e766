/*!
Synthetic telemetry source.

Flies a deterministic orbit so the bridge can be exercised without a
simulator. Optionally injects junk readings the way a live feed does.
*/

use crate::source::{simvars, SourceError, TelemetrySource, VariableHandle};
use std::f64::consts::TAU;
use std::time::Duration;
use tracing::info;

/// Value the live feed produces when it has nothing sensible to report
pub const JUNK_VALUE: f64 = -999999.0;

/// Parameters for the synthetic orbit
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitParams {
    /// Orbit centre, degrees
    pub center_lat: f64,
    pub center_lon: f64,
    /// Orbit radius, degrees of latitude
    pub radius_deg: f64,
    /// Feet
    pub altitude_ft: f64,
    /// Knots
    pub ground_speed_kt: f64,
    /// Time for one full circle
    pub period: Duration,
    /// Time advanced per tick
    pub step: Duration,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            // LaGuardia
            center_lat: 40.7772,
            center_lon: -73.8726,
            radius_deg: 0.05,
            altitude_ft: 2500.0,
            ground_speed_kt: 120.0,
            period: Duration::from_secs(180),
            step: Duration::from_millis(200),
        }
    }
}

/// An aircraft orbiting a fixed point at constant altitude
pub struct SyntheticSource {
    params: OrbitParams,
    elapsed: Duration,
    glitch_every: u64,
    reads: u64,
    live: bool,
}

impl SyntheticSource {
    /// Open the synthetic link. `glitch_every` = N makes every Nth read junk.
    pub fn connect(params: OrbitParams, glitch_every: u64) -> Self {
        info!("🧪 Synthetic source orbiting {:.4},{:.4} at {} ft",
              params.center_lat, params.center_lon, params.altitude_ft);
        Self {
            params,
            elapsed: Duration::ZERO,
            glitch_every,
            reads: 0,
            live: true,
        }
    }

    /// Orbit angle in radians for the current time
    fn phase(&self) -> f64 {
        TAU * self.elapsed.as_secs_f64() / self.params.period.as_secs_f64()
    }

    fn value(&self, name: &str) -> f64 {
        let phase = self.phase();
        let p = &self.params;
        match name {
            simvars::PLANE_LATITUDE => p.center_lat + p.radius_deg * phase.cos(),
            simvars::PLANE_LONGITUDE => {
                let lon_scale = p.center_lat.to_radians().cos().max(0.01);
                p.center_lon + p.radius_deg / lon_scale * phase.sin()
            }
            simvars::PLANE_ALTITUDE => p.altitude_ft,
            // Counter-clockwise around the centre, tangent to the circle
            simvars::PLANE_HEADING_DEGREES_TRUE => (phase + TAU / 4.0).rem_euclid(TAU),
            simvars::GROUND_VELOCITY => p.ground_speed_kt,
            simvars::PLANE_PITCH_DEGREES => 0.03 * (phase * 4.0).sin(),
            // Steady left bank, positive bank is left in sim convention
            simvars::PLANE_BANK_DEGREES => 0.35 + 0.02 * (phase * 3.0).cos(),
            _ => 0.0,
        }
    }
}

impl TelemetrySource for SyntheticSource {
    fn resolve(&mut self, name: &str) -> Result<VariableHandle, SourceError> {
        simvars::ALL
            .iter()
            .position(|known| *known == name)
            .map(VariableHandle)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn read(&mut self, handle: VariableHandle) -> Result<f64, SourceError> {
        if !self.live {
            return Err(SourceError::Disconnected);
        }

        let name = *simvars::ALL.get(handle.0).ok_or(SourceError::Unavailable)?;

        self.reads += 1;
        if self.glitch_every > 0 && self.reads % self.glitch_every == 0 {
            return Ok(JUNK_VALUE);
        }

        Ok(self.value(name))
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn disconnect(&mut self) {
        if self.live {
            info!("🧪 Synthetic source disconnected after {} reads", self.reads);
        }
        self.live = false;
    }

    fn advance(&mut self) {
        self.elapsed += self.params.step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::{ranges, AircraftVariables};

    #[test]
    fn test_resolves_only_known_variables() {
        let mut source = SyntheticSource::connect(OrbitParams::default(), 0);
        assert_eq!(source.resolve(simvars::PLANE_LATITUDE), Ok(VariableHandle(0)));
        assert_eq!(source.resolve(simvars::PLANE_BANK_DEGREES), Ok(VariableHandle(6)));
        assert_eq!(
            source.resolve("FUEL_TOTAL_QUANTITY"),
            Err(SourceError::NotFound("FUEL_TOTAL_QUANTITY".to_string()))
        );
    }

    #[test]
    fn test_values_stay_in_range() {
        let mut source = SyntheticSource::connect(OrbitParams::default(), 0);
        let mut vars = AircraftVariables::register(&mut source).unwrap();

        for _ in 0..1000 {
            source.advance();
            let sample = vars.sample(&mut source);
            assert!(ranges::LATITUDE.contains(sample.latitude));
            assert!(ranges::LONGITUDE.contains(sample.longitude));
            assert!(ranges::ANGLE.contains(sample.heading_rad));
            assert!(sample.heading_rad >= 0.0);
        }
        assert_eq!(vars.total_fallbacks(), 0);
    }

    #[test]
    fn test_aircraft_moves_between_ticks() {
        let mut source = SyntheticSource::connect(OrbitParams::default(), 0);
        let mut vars = AircraftVariables::register(&mut source).unwrap();

        source.advance();
        let first = vars.sample(&mut source);
        source.advance();
        let second = vars.sample(&mut source);
        assert_ne!(first.latitude, second.latitude);
    }

    #[test]
    fn test_glitches_are_absorbed_by_fallback() {
        let mut source = SyntheticSource::connect(OrbitParams::default(), 5);
        let mut vars = AircraftVariables::register(&mut source).unwrap();

        for _ in 0..10 {
            source.advance();
            let sample = vars.sample(&mut source);
            assert_ne!(sample.latitude, JUNK_VALUE);
            assert_ne!(sample.altitude_ft, JUNK_VALUE);
        }
        // 70 reads, every fifth one junk
        assert_eq!(vars.total_fallbacks(), 14);
    }

    #[test]
    fn test_disconnect() {
        let mut source = SyntheticSource::connect(OrbitParams::default(), 0);
        assert!(source.is_live());
        source.disconnect();
        assert!(!source.is_live());
        assert_eq!(source.read(VariableHandle(0)), Err(SourceError::Disconnected));
    }
}
