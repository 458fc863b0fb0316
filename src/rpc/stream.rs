//! Sensor snapshot packets pushed at the negotiated broadcast rate.
//!
//! ```text
//! ┌─────┬──────────────┬───────────────────────────────────────────┐
//! │ 'Q' │ timestamp i32│ per sensor: count u8, count × f64 (or 0)  │
//! └─────┴──────────────┴───────────────────────────────────────────┘
//! ```
//!
//! Sensors appear in [`SensorKind::ALL`](crate::sensors::SensorKind::ALL)
//! order.  An unsupported sensor contributes a single zero count byte.

use crate::sensors::SensorValues;

use super::codec::Writer;
use super::opcode::event;

/// Encode one snapshot from readings in snapshot order.
pub fn encode_snapshot(timestamp: i32, readings: &[Option<SensorValues>]) -> Vec<u8> {
    let mut w = Writer::new(event::SNAPSHOT).i32(timestamp);
    for reading in readings {
        match reading {
            Some(values) => {
                w = w.u8(values.len() as u8);
                for &v in values {
                    w = w.f64(v);
                }
            }
            None => w = w.u8(0),
        }
    }
    w.finish()
}

/// Reply to a single sensor read: the opcode, then the values if supported.
pub fn encode_reading(opcode: u8, reading: Option<&SensorValues>) -> Vec<u8> {
    let mut w = Writer::new(opcode);
    for &v in reading.into_iter().flatten() {
        w = w.f64(v);
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[f64]) -> SensorValues {
        SensorValues::from_slice(v).unwrap()
    }

    #[test]
    fn empty_snapshot_is_all_zero_counts() {
        let readings: [Option<SensorValues>; 13] = Default::default();
        let packet = encode_snapshot(5, &readings);
        assert_eq!(packet.len(), 1 + 4 + 13);
        assert_eq!(packet[0], b'Q');
        assert_eq!(&packet[1..5], &5i32.to_be_bytes());
        assert!(packet[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn supported_sensor_carries_doubles() {
        let mut readings: [Option<SensorValues>; 13] = Default::default();
        readings[7] = Some(values(&[0.25])); // sound
        let packet = encode_snapshot(-1, &readings);
        // 7 empty sensors, then count 1 and one double.
        assert_eq!(packet[5 + 7], 1);
        assert_eq!(&packet[13..21], &0.25f64.to_be_bytes());
        assert_eq!(packet.len(), 1 + 4 + 13 + 8);
    }

    #[test]
    fn single_reading_reply() {
        assert_eq!(encode_reading(b'A', None), vec![b'A']);
        let reply = encode_reading(b'P', Some(&values(&[3.0])));
        assert_eq!(reply.len(), 9);
        assert_eq!(&reply[1..], &3.0f64.to_be_bytes());
    }
}
