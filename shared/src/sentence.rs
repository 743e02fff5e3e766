/*!
XGPS/XATT sentence assembly.

Moving-map apps that speak the X-Plane "ForeFlight" protocol accept two
comma-separated text sentences:

- `XGPS1,<lon>,<lat>,<alt_m>,<true_hdg_deg>,<speed_mps>`
- `XATT1,<true_hdg_deg>,<pitch_deg>,<bank_deg>,0,0,0,<-speed_mps>,<pitch_deg>,0,0,0,0`

The trailing XATT fields are gyro/accelerometer channels this bridge does
not produce; receivers only need them present.
*/

use crate::protocol::{
    ATTITUDE_PREFIX, ATTITUDE_DECIMALS, COORDINATE_DECIMALS, POSITION_PREFIX, VALUE_DECIMALS,
};
use crate::units::ProtocolSample;

/// The two sentence types sent by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentenceKind {
    /// `XGPS1`, sent once per second
    Position,
    /// `XATT1`, sent every tick
    Attitude,
}

impl SentenceKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Position => POSITION_PREFIX,
            Self::Attitude => ATTITUDE_PREFIX,
        }
    }

    /// Identify a formatted sentence by its prefix
    pub fn of(sentence: &str) -> Option<Self> {
        let prefix = sentence.split(',').next()?;
        match prefix {
            POSITION_PREFIX => Some(Self::Position),
            ATTITUDE_PREFIX => Some(Self::Attitude),
            _ => None,
        }
    }
}

/// Round half away from zero to `digits` decimals and print the shortest
/// decimal that round-trips. Whole numbers keep one decimal (`90.0`); zero
/// of either sign prints as `0`.
///
/// Rounding applies to the binary value, not its decimal spelling: `1.005`
/// is stored just below the half and comes out as `1.0` at two digits.
pub fn format_decimal(value: f64, digits: u32) -> String {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;

    if rounded == 0.0 {
        return "0".to_string();
    }

    let text = rounded.to_string();
    if text.contains('.') || !rounded.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Build the `XGPS1` sentence. Longitude comes before latitude.
pub fn position_sentence(sample: &ProtocolSample) -> String {
    format!(
        "{},{},{},{},{},{}",
        POSITION_PREFIX,
        format_decimal(sample.longitude, COORDINATE_DECIMALS),
        format_decimal(sample.latitude, COORDINATE_DECIMALS),
        format_decimal(sample.altitude_m, VALUE_DECIMALS),
        format_decimal(sample.heading_deg, VALUE_DECIMALS),
        format_decimal(sample.speed_mps, VALUE_DECIMALS),
    )
}

/// Build the `XATT1` sentence
pub fn attitude_sentence(sample: &ProtocolSample) -> String {
    let pitch = format_decimal(sample.pitch_deg, ATTITUDE_DECIMALS);
    format!(
        "{},{},{},{},0,0,0,{},{},0,0,0,0",
        ATTITUDE_PREFIX,
        format_decimal(sample.heading_deg, ATTITUDE_DECIMALS),
        pitch,
        format_decimal(sample.bank_deg, ATTITUDE_DECIMALS),
        format_decimal(-sample.speed_mps, VALUE_DECIMALS),
        pitch,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::AircraftSample;
    use std::f64::consts::FRAC_PI_2;

    fn laguardia_sample() -> ProtocolSample {
        ProtocolSample::from(&AircraftSample {
            latitude: 40.78,
            longitude: -73.88,
            altitude_ft: 1000.0,
            heading_rad: FRAC_PI_2,
            ground_speed_kt: 100.0,
            pitch_rad: 0.0,
            bank_rad: 0.0,
        })
    }

    #[test]
    fn test_format_decimal_rounding() {
        assert_eq!(format_decimal(40.7821715, 5), "40.78217");
        assert_eq!(format_decimal(2.2, 2), "2.2");
        assert_eq!(format_decimal(90.0, 2), "90.0");
        assert_eq!(format_decimal(51.413881748, 2), "51.41");
        assert_eq!(format_decimal(-73.878280, 5), "-73.87828");
        assert_eq!(format_decimal(0.125, 2), "0.13");
    }

    #[test]
    fn test_format_decimal_zero() {
        assert_eq!(format_decimal(0.0, 2), "0");
        assert_eq!(format_decimal(-0.0, 2), "0");
        assert_eq!(format_decimal(0.001, 2), "0");
    }

    #[test]
    fn test_format_decimal_rounds_binary_value() {
        assert_eq!(format_decimal(1.005, 2), "1.0");
        assert_eq!(format_decimal(1.015625, 2), "1.02");
    }

    #[test]
    fn test_format_decimal_never_scientific() {
        assert_eq!(format_decimal(99999.0 * 0.3048, 2), "30479.7");
        assert!(!format_decimal(1e-7, 5).contains('e'));
    }

    #[test]
    fn test_position_sentence() {
        assert_eq!(
            position_sentence(&laguardia_sample()),
            "XGPS1,-73.88,40.78,304.8,90.0,51.41"
        );
    }

    #[test]
    fn test_attitude_sentence() {
        assert_eq!(
            attitude_sentence(&laguardia_sample()),
            "XATT1,90.0,0,0,0,0,0,-51.41,0,0,0,0,0"
        );
    }

    #[test]
    fn test_attitude_sentence_pitch_sign() {
        let mut sample = laguardia_sample();
        sample.pitch_deg = crate::units::attitude_to_protocol(0.1);

        let sentence = attitude_sentence(&sample);
        let fields: Vec<&str> = sentence.split(',').collect();
        assert_eq!(fields.len(), 13);
        assert_eq!(fields[2], "-5.73");
        assert_eq!(fields[8], "-5.73");
    }

    #[test]
    fn test_sentence_kind() {
        let sample = laguardia_sample();
        assert_eq!(SentenceKind::of(&position_sentence(&sample)), Some(SentenceKind::Position));
        assert_eq!(SentenceKind::of(&attitude_sentence(&sample)), Some(SentenceKind::Attitude));
        assert_eq!(SentenceKind::of("XTRA1,1,2"), None);
        assert_eq!(SentenceKind::Position.prefix(), "XGPS1");
    }
}
