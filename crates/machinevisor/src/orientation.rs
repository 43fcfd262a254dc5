//! Orientation estimation from the latest accelerometer and gyroscope samples.
//!
//! Pitch and roll come from the gravity direction in the accelerometer
//! vector; the gyroscope only contributes the rotation speed used as a
//! stability gate. There is no filtering across samples: every update
//! recomputes from the two most recent axis groups.

use tokio::sync::watch;

use crate::types::{OrientationSample, PoseReading, Vector3};

/// Compute a pose from the latest acceleration and angular-rate vectors.
///
/// NaN results (e.g. when `ay` and `az` are both zero and `ax` is NaN)
/// are returned as-is; callers format them as unknown.
pub fn estimate(accel: Vector3, gyro: Vector3) -> PoseReading {
    let [ax, ay, az] = accel;
    let [gx, gy, gz] = gyro;

    let pitch = (-ax).atan2((ay * ay + az * az).sqrt());
    let roll = ay.atan2(az);

    PoseReading {
        pitch_deg: pitch.to_degrees(),
        roll_deg: roll.to_degrees(),
        angular_rate_mag: (gx * gx + gy * gy + gz * gz).sqrt(),
    }
}

impl OrientationSample {
    pub fn pose(&self) -> PoseReading {
        estimate(self.accel, self.gyro)
    }
}

/// Shared holder of the latest [`OrientationSample`].
///
/// Each sensor event swaps in a whole new snapshot, so readers never see
/// a half-written axis tuple. One writer per axis group, any number of
/// readers.
pub struct OrientationState {
    tx: watch::Sender<OrientationSample>,
}

impl OrientationState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(OrientationSample::default());
        Self { tx }
    }

    /// Store a new accelerometer vector; the gyro vector is kept.
    pub fn update_accel(&self, accel: Vector3) -> PoseReading {
        self.tx.send_modify(|sample| sample.accel = accel);
        self.pose()
    }

    /// Store a new gyroscope vector; the accelerometer vector is kept.
    pub fn update_gyro(&self, gyro: Vector3) -> PoseReading {
        self.tx.send_modify(|sample| sample.gyro = gyro);
        self.pose()
    }

    /// Copy of the latest sample.
    pub fn sample(&self) -> OrientationSample {
        *self.tx.borrow()
    }

    /// Pose computed from the latest sample.
    pub fn pose(&self) -> PoseReading {
        self.sample().pose()
    }

    /// Watch every snapshot swap.
    pub fn subscribe(&self) -> watch::Receiver<OrientationSample> {
        self.tx.subscribe()
    }
}

impl Default for OrientationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_flat_device() {
        let pose = estimate([0.0, 0.0, 9.81], [0.0, 0.0, 0.0]);
        assert!(pose.pitch_deg.abs() < EPS);
        assert!(pose.roll_deg.abs() < EPS);
        assert_eq!(pose.angular_rate_mag, 0.0);
    }

    #[test]
    fn test_estimate_is_pure() {
        let accel = [1.3, 7.2, 5.9];
        let gyro = [0.1, 0.2, 0.3];
        let a = estimate(accel, gyro);
        let b = estimate(accel, gyro);
        assert_eq!(a.pitch_deg, b.pitch_deg);
        assert_eq!(a, b);
    }

    #[test]
    fn test_roll_sign_symmetry() {
        for &(ay, az) in &[(7.0, 3.0), (-2.5, 9.0), (9.81, 0.01), (0.5, -4.0)] {
            let r1 = estimate([0.0, ay, az], [0.0; 3]).roll_deg;
            let r2 = estimate([0.0, -ay, -az], [0.0; 3]).roll_deg;
            assert!(((r1 - r2).abs() - 180.0).abs() < 1e-6, "ay={ay} az={az}");
        }
    }

    #[test]
    fn test_angular_rate_magnitude() {
        let pose = estimate([0.0, 0.0, 1.0], [3.0, 4.0, 12.0]);
        assert!((pose.angular_rate_mag - 13.0).abs() < EPS);
    }

    #[test]
    fn test_nan_propagates_without_panic() {
        let pose = estimate([f64::NAN, 0.0, 0.0], [0.0; 3]);
        assert!(pose.pitch_deg.is_nan());
    }

    #[test]
    fn test_state_keeps_other_axis_group() {
        let state = OrientationState::new();
        state.update_gyro([0.0, 0.0, 2.0]);
        let pose = state.update_accel([0.0, 9.0, 3.0]);
        assert!((pose.angular_rate_mag - 2.0).abs() < EPS);
        assert_eq!(state.sample().gyro, [0.0, 0.0, 2.0]);

        let pose = state.update_gyro([0.0, 0.0, 0.0]);
        assert_eq!(pose.angular_rate_mag, 0.0);
        assert_eq!(state.sample().accel, [0.0, 9.0, 3.0]);
    }

    #[test]
    fn test_subscribers_see_updates() {
        let state = OrientationState::new();
        let mut rx = state.subscribe();
        state.update_accel([1.0, 2.0, 3.0]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().accel, [1.0, 2.0, 3.0]);
    }
}
