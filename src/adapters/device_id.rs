//! Device identity: six random bytes generated on first start and kept in
//! settings.
//!
//! The id prefixes every outbound packet and is how the server tells phones
//! apart.  It is shown to the user in hex (`0a1b2c3d4e5f`) so they can type
//! it into the server-side project.

use core::fmt::Write;

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::rpc::auth::fill_random;
use crate::rpc::codec::DEVICE_ID_SIZE;

const NAMESPACE: &str = "settings";
const KEY: &str = "device_id";

/// Lowercase hex form of the id.
pub type DeviceIdString = heapless::String<{ DEVICE_ID_SIZE * 2 }>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    bytes: [u8; DEVICE_ID_SIZE],
}

impl DeviceIdentity {
    pub const fn from_bytes(bytes: [u8; DEVICE_ID_SIZE]) -> Self {
        Self { bytes }
    }

    /// Fresh random id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; DEVICE_ID_SIZE];
        fill_random(&mut bytes);
        Self { bytes }
    }

    /// The stored id, or a new one that is stored before returning.
    ///
    /// A stored value of the wrong length is replaced.  Failing to persist a
    /// new id is not fatal: the id then changes on the next start.
    pub fn load_or_generate(storage: &mut dyn StoragePort) -> Result<Self, StorageError> {
        let mut buf = [0u8; DEVICE_ID_SIZE + 1];
        match storage.read(NAMESPACE, KEY, &mut buf) {
            Ok(DEVICE_ID_SIZE) => {
                let mut bytes = [0u8; DEVICE_ID_SIZE];
                bytes.copy_from_slice(&buf[..DEVICE_ID_SIZE]);
                return Ok(Self { bytes });
            }
            Ok(len) => warn!("ID: stored id has {len} bytes, replacing"),
            Err(StorageError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let id = Self::generate();
        info!("ID: generated {}", id.hex());
        if let Err(e) = storage.write(NAMESPACE, KEY, &id.bytes) {
            warn!("ID: could not persist device id: {e}");
        }
        Ok(id)
    }

    pub fn bytes(&self) -> &[u8; DEVICE_ID_SIZE] {
        &self.bytes
    }

    pub fn hex(&self) -> DeviceIdString {
        let mut out = DeviceIdString::new();
        for b in self.bytes {
            let _ = write!(out, "{b:02x}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::SettingsStore;

    #[test]
    fn hex_format() {
        let id = DeviceIdentity::from_bytes([0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f]);
        assert_eq!(id.hex().as_str(), "0a1b2c3d4e5f");
    }

    #[test]
    fn generated_once_then_reloaded() {
        let mut store = SettingsStore::in_memory();
        let first = DeviceIdentity::load_or_generate(&mut store).unwrap();
        let second = DeviceIdentity::load_or_generate(&mut store).unwrap();
        assert_eq!(first, second);
        assert!(store.exists(NAMESPACE, KEY));
    }

    #[test]
    fn malformed_stored_id_is_replaced() {
        let mut store = SettingsStore::in_memory();
        store.write(NAMESPACE, KEY, &[1, 2, 3]).unwrap();
        let id = DeviceIdentity::load_or_generate(&mut store).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(store.read(NAMESPACE, KEY, &mut buf), Ok(DEVICE_ID_SIZE));
        assert_eq!(&buf[..DEVICE_ID_SIZE], id.bytes());
    }
}
