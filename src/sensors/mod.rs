//! Sensor subsystem: individual sensors and the aggregating [`SensorHub`].
//!
//! Every sensor, raw or derived, is read through [`BasicSensor`]: it is
//! either supported and yields a fixed-arity vector, or it is not.  The
//! platform pushes samples into the raw sensors; derived sensors compute
//! their value from other sensors at read time.
//!
//! ```text
//!  platform samples ──▶ RawSensor ×10 ──┬──▶ read(kind)
//!                                       │
//!  accelerometer + magnetometer ──▶ OrientationSensor
//!  location fixes ───────────────▶ LocationSensor
//!  microphone amplitude ─────────▶ SoundSensor
//! ```

pub mod location;
pub mod orientation;
pub mod raw;
pub mod sound;

use std::sync::Arc;

use crate::rpc::opcode::Opcode;
use location::LocationSensor;
use orientation::OrientationSensor;
use raw::RawSensor;
use sound::SoundSensor;

/// Sensor vector; no sensor has more than four components.
pub type SensorValues = heapless::Vec<f64, 4>;

/// Gyroscope and rotation vectors are reported in degrees.
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// Uniform view over raw and derived sensors.
pub trait BasicSensor: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Current value, or `None` when unsupported.
    fn read(&self) -> Option<SensorValues>;
}

/// Every sensor the engine exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Accelerometer,
    Gravity,
    LinearAcceleration,
    Gyroscope,
    RotationVector,
    GameRotationVector,
    MagneticField,
    Sound,
    Proximity,
    StepCounter,
    Light,
    Location,
    Orientation,
}

impl SensorKind {
    /// Snapshot order.
    pub const ALL: [Self; 13] = [
        Self::Accelerometer,
        Self::Gravity,
        Self::LinearAcceleration,
        Self::Gyroscope,
        Self::RotationVector,
        Self::GameRotationVector,
        Self::MagneticField,
        Self::Sound,
        Self::Proximity,
        Self::StepCounter,
        Self::Light,
        Self::Location,
        Self::Orientation,
    ];

    /// Read opcode for this sensor.
    pub fn opcode(self) -> Opcode {
        match self {
            Self::Accelerometer => Opcode::Accelerometer,
            Self::Gravity => Opcode::Gravity,
            Self::LinearAcceleration => Opcode::LinearAcceleration,
            Self::Gyroscope => Opcode::Gyroscope,
            Self::RotationVector => Opcode::RotationVector,
            Self::GameRotationVector => Opcode::GameRotationVector,
            Self::MagneticField => Opcode::MagneticField,
            Self::Sound => Opcode::Sound,
            Self::Proximity => Opcode::Proximity,
            Self::StepCounter => Opcode::StepCounter,
            Self::Light => Opcode::Light,
            Self::Location => Opcode::Location,
            Self::Orientation => Opcode::Orientation,
        }
    }

    pub fn from_opcode(op: Opcode) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.opcode() == op)
    }

    /// Number of values in a reading.
    pub fn dims(self) -> usize {
        match self {
            Self::RotationVector | Self::Location => 4,
            Self::Accelerometer
            | Self::Gravity
            | Self::LinearAcceleration
            | Self::Gyroscope
            | Self::GameRotationVector
            | Self::MagneticField
            | Self::Orientation => 3,
            Self::Sound | Self::Proximity | Self::StepCounter | Self::Light => 1,
        }
    }

    /// Factor applied to raw platform samples.
    fn scale(self) -> f64 {
        match self {
            Self::Gyroscope | Self::RotationVector | Self::GameRotationVector => RAD_TO_DEG,
            _ => 1.0,
        }
    }
}

/// Aggregates every sensor.  Shared by the dispatcher, the broadcaster and
/// the platform feed.
pub struct SensorHub {
    pub accelerometer: Arc<RawSensor>,
    pub gravity: Arc<RawSensor>,
    pub linear_acceleration: Arc<RawSensor>,
    pub gyroscope: Arc<RawSensor>,
    pub rotation_vector: Arc<RawSensor>,
    pub game_rotation_vector: Arc<RawSensor>,
    pub magnetic_field: Arc<RawSensor>,
    pub proximity: Arc<RawSensor>,
    pub step_counter: Arc<RawSensor>,
    pub light: Arc<RawSensor>,
    pub sound: Arc<SoundSensor>,
    pub location: Arc<LocationSensor>,
    pub orientation: OrientationSensor,
}

impl Default for SensorHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorHub {
    /// All sensors start unsupported until the platform reports them.
    pub fn new() -> Self {
        let raw = |kind: SensorKind| Arc::new(RawSensor::new(kind.dims(), kind.scale()));
        let accelerometer = raw(SensorKind::Accelerometer);
        let magnetic_field = raw(SensorKind::MagneticField);
        Self {
            orientation: OrientationSensor::new(accelerometer.clone(), magnetic_field.clone()),
            accelerometer,
            gravity: raw(SensorKind::Gravity),
            linear_acceleration: raw(SensorKind::LinearAcceleration),
            gyroscope: raw(SensorKind::Gyroscope),
            rotation_vector: raw(SensorKind::RotationVector),
            game_rotation_vector: raw(SensorKind::GameRotationVector),
            magnetic_field,
            proximity: raw(SensorKind::Proximity),
            step_counter: raw(SensorKind::StepCounter),
            light: raw(SensorKind::Light),
            sound: Arc::new(SoundSensor::new()),
            location: Arc::new(LocationSensor::new()),
        }
    }

    pub fn sensor(&self, kind: SensorKind) -> &dyn BasicSensor {
        if let Some(raw) = self.raw(kind) {
            return &**raw;
        }
        match kind {
            SensorKind::Sound => &*self.sound,
            SensorKind::Location => &*self.location,
            _ => &self.orientation,
        }
    }

    /// Raw sensor fed by platform samples; `None` for derived sensors.
    pub fn raw(&self, kind: SensorKind) -> Option<&Arc<RawSensor>> {
        Some(match kind {
            SensorKind::Accelerometer => &self.accelerometer,
            SensorKind::Gravity => &self.gravity,
            SensorKind::LinearAcceleration => &self.linear_acceleration,
            SensorKind::Gyroscope => &self.gyroscope,
            SensorKind::RotationVector => &self.rotation_vector,
            SensorKind::GameRotationVector => &self.game_rotation_vector,
            SensorKind::MagneticField => &self.magnetic_field,
            SensorKind::Proximity => &self.proximity,
            SensorKind::StepCounter => &self.step_counter,
            SensorKind::Light => &self.light,
            SensorKind::Sound | SensorKind::Location | SensorKind::Orientation => return None,
        })
    }

    pub fn read(&self, kind: SensorKind) -> Option<SensorValues> {
        self.sensor(kind).read()
    }

    /// One reading per sensor, in snapshot order.
    pub fn read_all(&self) -> [Option<SensorValues>; 13] {
        SensorKind::ALL.map(|kind| self.read(kind))
    }
}
