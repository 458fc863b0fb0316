//! Simulated platform sensors.
//!
//! Stands in for the phone's sensor service when the engine runs on a host:
//! every raw sensor is marked supported and fed a slow synthetic signal,
//! location gets a fixed fix, and the microphone reports a sweeping
//! amplitude.
//!
//! ```text
//!  feed thread (50 ms) ──▶ RawSensor::update ─┐
//!                       ──▶ LocationSensor    ├──▶ SensorHub ──▶ reads / snapshots
//!  SimulatedMicrophone ──▶ SoundSensor sampler┘
//! ```

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::info;

use crate::app::context::EngineContext;
use crate::sensors::location::LocationFix;
use crate::sensors::sound::AmplitudeSource;
use crate::sensors::SensorKind;

/// Interval between synthetic samples.
pub const FEED_PERIOD: Duration = Duration::from_millis(50);

/// Standard gravity, m/s².
const G: f32 = 9.81;

/// Sample for `kind` at phase `t` (radians).
fn sample(kind: SensorKind, t: f32) -> [f32; 4] {
    let (s, c) = t.sin_cos();
    match kind {
        SensorKind::Accelerometer | SensorKind::Gravity => [0.5 * s, 0.5 * c, G, 0.0],
        SensorKind::LinearAcceleration => [0.5 * s, 0.5 * c, 0.0, 0.0],
        SensorKind::Gyroscope => [0.01 * c, 0.0, 0.01 * s, 0.0],
        SensorKind::RotationVector | SensorKind::GameRotationVector => {
            [0.0, 0.0, (t / 2.0).sin(), (t / 2.0).cos()]
        }
        SensorKind::MagneticField => [0.0, 22.0, -42.0, 0.0],
        SensorKind::Proximity => [if s > 0.9 { 0.0 } else { 5.0 }, 0.0, 0.0, 0.0],
        SensorKind::StepCounter => [(t / TAU).floor(), 0.0, 0.0, 0.0],
        SensorKind::Light => [300.0 + 50.0 * s, 0.0, 0.0, 0.0],
        SensorKind::Sound | SensorKind::Location | SensorKind::Orientation => [0.0; 4],
    }
}

/// Mark every sensor supported and start the feed thread.  The thread parks
/// while sensors are paused and exits when the run gate closes.
pub fn spawn_sensor_feed(ctx: Arc<EngineContext>) -> std::io::Result<JoinHandle<()>> {
    let hub = &ctx.sensors;
    for kind in SensorKind::ALL {
        if let Some(raw) = hub.raw(kind) {
            raw.set_supported(true);
        }
    }
    hub.location.set_supported(true);
    hub.location.on_fix(LocationFix {
        latitude: 36.1627,
        longitude: -86.7816,
        bearing: 0.0,
        altitude: 182.0,
    });

    thread::Builder::new()
        .name("phoneiot-sim".into())
        .spawn(move || {
            info!("SIM: sensor feed started");
            let mut t = 0.0f32;
            while ctx.gate.wait_running() {
                for kind in SensorKind::ALL {
                    if let Some(raw) = ctx.sensors.raw(kind) {
                        raw.update(&sample(kind, t)[..raw.dims()]);
                    }
                }
                t = (t + 0.05) % (1000.0 * TAU);
                thread::sleep(FEED_PERIOD);
            }
            info!("SIM: sensor feed stopped");
        })
}

/// Microphone whose peak amplitude sweeps up and wraps.
#[derive(Default)]
pub struct SimulatedMicrophone {
    step: AtomicU32,
}

impl AmplitudeSource for SimulatedMicrophone {
    fn max_amplitude(&self) -> Option<u16> {
        let step = self.step.fetch_add(1, Ordering::Relaxed);
        Some(((step % 64) * 512) as u16)
    }
}
