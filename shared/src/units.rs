/*!
Unit conversion from simulator units to X-Plane protocol units.

The simulator reports feet, radians and knots; the sentences carry meters,
degrees and meters per second. Pitch and bank are also sign-flipped because
the receiving protocol uses the opposite convention.
*/

use crate::variables::AircraftSample;

/// Feet to meters
pub const FEET_TO_METERS: f64 = 0.3048;

/// Divisor taking knots to meters per second
pub const KNOTS_PER_MPS: f64 = 1.945;

pub fn feet_to_meters(feet: f64) -> f64 {
    feet * FEET_TO_METERS
}

pub fn radians_to_degrees(radians: f64) -> f64 {
    radians.to_degrees()
}

pub fn knots_to_mps(knots: f64) -> f64 {
    knots / KNOTS_PER_MPS
}

/// Pitch or bank in protocol convention: degrees, opposite sign
pub fn attitude_to_protocol(radians: f64) -> f64 {
    -radians.to_degrees()
}

/// A sample expressed in protocol units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProtocolSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub heading_deg: f64,
    pub speed_mps: f64,
    pub pitch_deg: f64,
    pub bank_deg: f64,
}

impl From<&AircraftSample> for ProtocolSample {
    fn from(sample: &AircraftSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude_m: feet_to_meters(sample.altitude_ft),
            heading_deg: radians_to_degrees(sample.heading_rad),
            speed_mps: knots_to_mps(sample.ground_speed_kt),
            pitch_deg: attitude_to_protocol(sample.pitch_rad),
            bank_deg: attitude_to_protocol(sample.bank_rad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_altitude_conversion() {
        assert!((feet_to_meters(1000.0) - 304.8).abs() < 0.01);
    }

    #[test]
    fn test_speed_conversion() {
        assert!((knots_to_mps(100.0) - 51.41).abs() < 0.01);
    }

    #[test]
    fn test_heading_conversion() {
        assert!((radians_to_degrees(FRAC_PI_2) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_attitude_sign_is_flipped() {
        assert!(attitude_to_protocol(0.1) < 0.0);
        assert!((attitude_to_protocol(-0.1) - 5.7296).abs() < 0.001);
    }

    #[test]
    fn test_sample_conversion() {
        let sample = AircraftSample {
            latitude: 40.78,
            longitude: -73.88,
            altitude_ft: 1000.0,
            heading_rad: FRAC_PI_2,
            ground_speed_kt: 100.0,
            pitch_rad: 0.1,
            bank_rad: 0.0,
        };

        let converted = ProtocolSample::from(&sample);
        assert_eq!(converted.latitude, 40.78);
        assert_eq!(converted.longitude, -73.88);
        assert!((converted.altitude_m - 304.8).abs() < 0.01);
        assert!((converted.heading_deg - 90.0).abs() < 1e-9);
        assert!(converted.pitch_deg < 0.0);
    }
}
