//! Orientation derived from the accelerometer and the magnetometer.
//!
//! The two vectors give a rotation matrix (east, north, up rows) from which
//! azimuth, pitch and roll follow.  The matrix cannot be built in free fall
//! or next to a strong magnetic disturbance; the last good orientation is
//! reported instead.
//!
//! ```text
//!   a (gravity) ─┐
//!                ├─▶ H = m × a ─▶ M = a × H ─▶ R = [H; M; a] ─▶ (az, pitch, roll)
//!   m (field) ───┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use super::raw::RawSensor;
use super::{BasicSensor, RAD_TO_DEG, SensorValues};

/// Standard gravity (m/s²).
const STANDARD_GRAVITY: f64 = 9.81;
/// Below 10 % of gravity the device is considered in free fall.
const FREE_FALL_GRAVITY_SQUARED: f64 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;
/// Minimum horizontal field magnitude; smaller means the device is near
/// a magnetic pole or the field is disturbed.
const MIN_HORIZONTAL_FIELD: f64 = 0.1;

/// Row-major 3×3 rotation matrix from device to world coordinates.
pub fn rotation_matrix(gravity: [f64; 3], geomagnetic: [f64; 3]) -> Option<[f64; 9]> {
    let [mut ax, mut ay, mut az] = gravity;
    let [ex, ey, ez] = geomagnetic;

    let norm_sq_a = ax * ax + ay * ay + az * az;
    if norm_sq_a < FREE_FALL_GRAVITY_SQUARED {
        return None;
    }

    let mut hx = ey * az - ez * ay;
    let mut hy = ez * ax - ex * az;
    let mut hz = ex * ay - ey * ax;
    let norm_h = (hx * hx + hy * hy + hz * hz).sqrt();
    if norm_h < MIN_HORIZONTAL_FIELD {
        return None;
    }

    let inv_h = 1.0 / norm_h;
    hx *= inv_h;
    hy *= inv_h;
    hz *= inv_h;
    let inv_a = 1.0 / norm_sq_a.sqrt();
    ax *= inv_a;
    ay *= inv_a;
    az *= inv_a;

    let mx = ay * hz - az * hy;
    let my = az * hx - ax * hz;
    let mz = ax * hy - ay * hx;

    Some([hx, hy, hz, mx, my, mz, ax, ay, az])
}

/// `(azimuth, pitch, roll)` in radians.
pub fn orientation_angles(r: &[f64; 9]) -> [f64; 3] {
    [r[1].atan2(r[4]), (-r[7]).asin(), (-r[6]).atan2(r[8])]
}

/// Orientation in degrees: azimuth, inverted pitch, roll.
pub struct OrientationSensor {
    accelerometer: Arc<RawSensor>,
    magnetometer: Arc<RawSensor>,
    last: Mutex<[f64; 3]>,
}

impl OrientationSensor {
    pub fn new(accelerometer: Arc<RawSensor>, magnetometer: Arc<RawSensor>) -> Self {
        Self {
            accelerometer,
            magnetometer,
            last: Mutex::new([0.0; 3]),
        }
    }
}

fn vec3(values: &SensorValues) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (slot, v) in out.iter_mut().zip(values) {
        *slot = *v;
    }
    out
}

impl BasicSensor for OrientationSensor {
    fn is_supported(&self) -> bool {
        self.accelerometer.is_supported() && self.magnetometer.is_supported()
    }

    fn read(&self) -> Option<SensorValues> {
        if !self.is_supported() {
            return None;
        }
        let a = vec3(&self.accelerometer.latest());
        let m = vec3(&self.magnetometer.latest());

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(r) = rotation_matrix(a, m) {
            let [azimuth, pitch, roll] = orientation_angles(&r);
            *last = [azimuth * RAD_TO_DEG, -pitch * RAD_TO_DEG, roll * RAD_TO_DEG];
        }
        Some(last.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(a: [f32; 3], m: [f32; 3]) -> OrientationSensor {
        let acc = Arc::new(RawSensor::new(3, 1.0));
        let mag = Arc::new(RawSensor::new(3, 1.0));
        acc.set_supported(true);
        mag.set_supported(true);
        acc.update(&a);
        mag.update(&m);
        OrientationSensor::new(acc, mag)
    }

    #[test]
    fn flat_facing_north_is_zero() {
        let s = sensor([0.0, 0.0, 9.81], [0.0, 20.0, -40.0]);
        let v = s.read().unwrap();
        assert!(v.iter().all(|x| x.abs() < 1e-9), "{v:?}");
    }

    #[test]
    fn flat_facing_west_is_minus_ninety() {
        // Magnetic north along the device's +x axis.
        let s = sensor([0.0, 0.0, 9.81], [20.0, 0.0, -40.0]);
        let v = s.read().unwrap();
        assert!((v[0] + 90.0).abs() < 1e-9, "{v:?}");
    }

    #[test]
    fn free_fall_keeps_last_good_value() {
        let s = sensor([0.0, 0.0, 9.81], [20.0, 0.0, -40.0]);
        let good = s.read().unwrap();
        s.accelerometer.update(&[0.0, 0.0, 0.5]);
        assert_eq!(s.read().unwrap(), good);
    }

    #[test]
    fn needs_both_inputs() {
        let s = sensor([0.0, 0.0, 9.81], [0.0, 20.0, -40.0]);
        s.magnetometer.set_supported(false);
        assert!(!s.is_supported());
        assert!(s.read().is_none());
    }

    #[test]
    fn weak_field_is_rejected() {
        assert!(rotation_matrix([0.0, 0.0, 9.81], [0.0, 0.0, -40.0]).is_none());
    }
}
