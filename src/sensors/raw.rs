//! Raw platform sensors.
//!
//! The platform pushes each sample as it arrives; reads return the latest
//! one.  Samples shorter than the sensor's arity are zero-filled, longer
//! ones are truncated.

use std::sync::{Mutex, PoisonError};

use super::{BasicSensor, SensorValues};

struct RawState {
    supported: bool,
    values: SensorValues,
}

/// Latest sample of one hardware sensor.
pub struct RawSensor {
    dims: usize,
    scale: f64,
    state: Mutex<RawState>,
}

impl RawSensor {
    pub fn new(dims: usize, scale: f64) -> Self {
        let mut values = SensorValues::new();
        let _ = values.resize(dims.min(4), 0.0);
        Self {
            dims,
            scale,
            state: Mutex::new(RawState {
                supported: false,
                values,
            }),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The platform found (or lost) this sensor.
    pub fn set_supported(&self, supported: bool) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .supported = supported;
    }

    /// Store a new sample.
    pub fn update(&self, sample: &[f32]) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for (i, slot) in state.values.iter_mut().enumerate() {
            *slot = sample.get(i).map_or(0.0, |&v| f64::from(v) * self.scale);
        }
    }

    /// Latest sample regardless of support, for derived sensors.
    pub fn latest(&self) -> SensorValues {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .clone()
    }
}

impl BasicSensor for RawSensor {
    fn is_supported(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .supported
    }

    fn read(&self) -> Option<SensorValues> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.supported.then(|| state.values.clone())
    }
}
