//! Advisory pose classification.
//!
//! The result only feeds the status text; captures run regardless of it.

use std::ops::RangeInclusive;

use crate::types::PoseReading;

/// Accepted pitch, in degrees (inclusive).
pub const PITCH_WINDOW_DEG: RangeInclusive<f64> = -15.0..=15.0;

/// Accepted absolute roll, in degrees (inclusive).
pub const ROLL_WINDOW_DEG: RangeInclusive<f64> = 65.0..=85.0;

/// The device counts as stable below this angular-rate magnitude.
pub const MAX_STABLE_RATE: f64 = 0.5;

/// Classification of one [`PoseReading`].
#[derive(Debug, Clone, PartialEq)]
pub struct PoseStatus {
    pub in_position: bool,
    pub pitch_text: String,
    pub roll_text: String,
}

impl PoseStatus {
    /// Three-line status shown under the camera preview.
    pub fn status_text(&self) -> String {
        let verdict = if self.in_position {
            "правильная позиция"
        } else {
            "неправильная позиция"
        };
        format!("Pitch {}°\nRoll {}°\n{verdict}", self.pitch_text, self.roll_text)
    }
}

pub fn classify(reading: &PoseReading) -> PoseStatus {
    let within_angles = PITCH_WINDOW_DEG.contains(&reading.pitch_deg)
        && ROLL_WINDOW_DEG.contains(&reading.roll_deg.abs());
    let stable = reading.angular_rate_mag < MAX_STABLE_RATE;

    PoseStatus {
        in_position: within_angles && stable,
        pitch_text: format_angle(reading.pitch_deg),
        roll_text: format_angle(reading.roll_deg),
    }
}

/// One decimal place; non-finite values render as `unknown`.
pub fn format_angle(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.1}")
    } else {
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(pitch: f64, roll: f64, rate: f64) -> PoseReading {
        PoseReading {
            pitch_deg: pitch,
            roll_deg: roll,
            angular_rate_mag: rate,
        }
    }

    #[test]
    fn test_in_position() {
        let status = classify(&reading(2.0, 75.0, 0.1));
        assert!(status.in_position);
        assert_eq!(status.pitch_text, "2.0");
        assert_eq!(status.roll_text, "75.0");
        assert!(status.status_text().ends_with("\nправильная позиция"));
    }

    #[test]
    fn test_negative_roll_uses_absolute_value() {
        assert!(classify(&reading(0.0, -70.0, 0.0)).in_position);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert!(classify(&reading(15.0, 65.0, 0.0)).in_position);
        assert!(classify(&reading(-15.0, 85.0, 0.0)).in_position);
        assert!(classify(&reading(0.0, -85.0, 0.0)).in_position);
        assert!(!classify(&reading(15.01, 75.0, 0.0)).in_position);
        assert!(!classify(&reading(0.0, 64.99, 0.0)).in_position);
        assert!(!classify(&reading(0.0, 85.01, 0.0)).in_position);
    }

    #[test]
    fn test_rate_gate_is_exclusive() {
        assert!(classify(&reading(0.0, 75.0, 0.49)).in_position);
        assert!(!classify(&reading(0.0, 75.0, 0.5)).in_position);
    }

    #[test]
    fn test_nan_renders_unknown() {
        let status = classify(&reading(f64::NAN, 75.0, 0.0));
        assert!(!status.in_position);
        assert_eq!(status.pitch_text, "unknown");
        assert_eq!(
            status.status_text(),
            "Pitch unknown°\nRoll 75.0°\nнеправильная позиция"
        );
    }

    #[test]
    fn test_format_rounds_to_one_decimal() {
        assert_eq!(format_angle(12.345), "12.3");
        assert_eq!(format_angle(-0.06), "-0.1");
        assert_eq!(format_angle(f64::INFINITY), "unknown");
    }
}
