//! Location sensor fed by fix callbacks from the platform location service.

use std::sync::{Mutex, PoisonError};

use super::{BasicSensor, SensorValues};

/// One position fix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees clockwise from north.
    pub bearing: f64,
    /// Metres above the WGS84 ellipsoid.
    pub altitude: f64,
}

#[derive(Default)]
struct LocationState {
    /// Location permission granted and a provider available.
    supported: bool,
    fix: LocationFix,
}

/// Latest fix.  Reports zeros until the first fix arrives.
#[derive(Default)]
pub struct LocationSensor {
    state: Mutex<LocationState>,
}

impl LocationSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_supported(&self, supported: bool) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .supported = supported;
    }

    pub fn on_fix(&self, fix: LocationFix) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).fix = fix;
    }
}

impl BasicSensor for LocationSensor {
    fn is_supported(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .supported
    }

    fn read(&self) -> Option<SensorValues> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.supported {
            return None;
        }
        let f = state.fix;
        Some([f.latitude, f.longitude, f.bearing, f.altitude].into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_latest_fix_in_order() {
        let s = LocationSensor::new();
        assert!(s.read().is_none());
        s.set_supported(true);
        assert_eq!(s.read().unwrap().as_slice(), &[0.0; 4]);
        s.on_fix(LocationFix {
            latitude: 36.1,
            longitude: -86.8,
            bearing: 90.0,
            altitude: 180.0,
        });
        assert_eq!(s.read().unwrap().as_slice(), &[36.1, -86.8, 90.0, 180.0]);
    }
}
