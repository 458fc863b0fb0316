//! Sound level from microphone amplitude.
//!
//! A sampler thread polls the peak amplitude every 250 ms while sensors are
//! running and stores it normalized to `[0, 1]`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info};

use super::{BasicSensor, SensorValues};
use crate::rpc::channels::RunGate;

/// Sampling period of the microphone.
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(250);

/// Full-scale amplitude of a 16-bit sample.
const FULL_SCALE: f64 = 32768.0;

/// Source of peak microphone amplitude.
pub trait AmplitudeSource: Send + Sync {
    /// Peak amplitude since the previous call, or `None` when the microphone
    /// is unavailable.
    fn max_amplitude(&self) -> Option<u16>;
}

/// Latest sound level.
#[derive(Default)]
pub struct SoundSensor {
    supported: AtomicBool,
    /// `f64` bits of the level.
    level: AtomicU64,
}

impl SoundSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw peak amplitude.
    pub fn record(&self, amplitude: u16) {
        let level = f64::from(amplitude) / FULL_SCALE;
        self.level.store(level.to_bits(), Ordering::Relaxed);
        self.supported.store(true, Ordering::Relaxed);
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::Relaxed);
    }

    /// Poll `source` until the gate closes.  Parks while sensors are stopped.
    pub fn spawn_sampler(
        self: &Arc<Self>,
        source: Arc<dyn AmplitudeSource>,
        gate: Arc<RunGate>,
    ) -> std::io::Result<JoinHandle<()>> {
        let sensor = Arc::clone(self);
        thread::Builder::new()
            .name("phoneiot-sound".into())
            .spawn(move || {
                info!("SOUND: sampler started");
                while gate.wait_running() {
                    match source.max_amplitude() {
                        Some(amplitude) => sensor.record(amplitude),
                        None => {
                            if sensor.is_supported() {
                                debug!("SOUND: microphone unavailable");
                            }
                            sensor.set_supported(false);
                        }
                    }
                    thread::sleep(SAMPLE_PERIOD);
                }
                info!("SOUND: sampler stopped");
            })
    }
}

impl BasicSensor for SoundSensor {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::Relaxed)
    }

    fn read(&self) -> Option<SensorValues> {
        self.is_supported().then(|| {
            let level = f64::from_bits(self.level.load(Ordering::Relaxed));
            [level].into_iter().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<u16>);

    impl AmplitudeSource for Fixed {
        fn max_amplitude(&self) -> Option<u16> {
            self.0
        }
    }

    #[test]
    fn amplitude_is_normalized() {
        let s = SoundSensor::new();
        assert!(s.read().is_none());
        s.record(16384);
        assert_eq!(s.read().unwrap().as_slice(), &[0.5]);
    }

    #[test]
    fn sampler_records_then_stops_on_close() {
        let sensor = Arc::new(SoundSensor::new());
        let gate = Arc::new(RunGate::new());
        gate.set_running(true);
        let handle = sensor
            .spawn_sampler(Arc::new(Fixed(Some(32767))), gate.clone())
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        gate.close();
        handle.join().unwrap();
        assert!(sensor.read().unwrap()[0] > 0.99);
    }

    #[test]
    fn missing_microphone_is_unsupported() {
        let sensor = Arc::new(SoundSensor::new());
        sensor.record(100);
        let gate = Arc::new(RunGate::new());
        gate.set_running(true);
        let handle = sensor.spawn_sampler(Arc::new(Fixed(None)), gate.clone()).unwrap();
        thread::sleep(Duration::from_millis(50));
        gate.close();
        handle.join().unwrap();
        assert!(!sensor.is_supported());
    }
}
