//! Session password.
//!
//! Every authenticated command carries the password in its header and is
//! accepted only on an exact match.  The password is a random 32-bit value
//! that stays valid for a fixed period; the first check after it expires
//! rolls a new one.  The user can also force a new password at any time.
//!
//! ```text
//!   current() ──▶ expired? ──yes──▶ regenerate ──▶ value
//!                    │
//!                    no ──────────────────────────▶ value
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::info;

use crate::app::ports::Clock;

/// Generated passwords fit in 32 bits so users can type them.
const PASSWORD_MASK: u64 = 0xFFFF_FFFF;

struct PasswordState {
    value: u64,
    /// Wall-clock expiry; `u64::MAX` for a fixed password.
    expires_at_ms: u64,
}

/// The rotating password shared by the dispatcher and the UI.
pub struct SessionPassword {
    state: Mutex<PasswordState>,
    validity_ms: u64,
    clock: Arc<dyn Clock>,
}

impl SessionPassword {
    /// With `fixed`, that password is used and never expires.  Otherwise a
    /// password is generated on first use.
    pub fn new(clock: Arc<dyn Clock>, validity: Duration, fixed: Option<u64>) -> Self {
        let state = match fixed {
            Some(value) => PasswordState {
                value,
                expires_at_ms: u64::MAX,
            },
            None => PasswordState {
                value: 0,
                expires_at_ms: 0,
            },
        };
        Self {
            state: Mutex::new(state),
            validity_ms: validity.as_millis() as u64,
            clock,
        }
    }

    /// The valid password, rolling a new one if the old one expired.
    pub fn current(&self) -> u64 {
        let now = self.clock.now_ms();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if now >= state.expires_at_ms {
            self.roll(&mut state, now);
        }
        state.value
    }

    /// Exact comparison against the valid password.
    pub fn verify(&self, candidate: u64) -> bool {
        candidate == self.current()
    }

    /// Replace the password now.
    pub fn regenerate(&self) -> u64 {
        let now = self.clock.now_ms();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.roll(&mut state, now);
        state.value
    }

    /// When the current password stops being accepted.
    pub fn expires_at_ms(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .expires_at_ms
    }

    fn roll(&self, state: &mut PasswordState, now: u64) {
        state.value = random_u64() & PASSWORD_MASK;
        state.expires_at_ms = now.saturating_add(self.validity_ms);
        info!("AUTH: new session password, valid for {} s", self.validity_ms / 1000);
    }
}

// ── Randomness ───────────────────────────────────────────────

/// Fill `buf` with non-cryptographic random bytes from `RandomState`.
pub fn fill_random(buf: &mut [u8]) {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    for chunk in buf.chunks_mut(8) {
        let s = RandomState::new();
        let val = s.build_hasher().finish().to_le_bytes();
        let len = chunk.len().min(val.len());
        chunk[..len].copy_from_slice(&val[..len]);
    }
}

pub fn random_u64() -> u64 {
    let mut buf = [0u8; 8];
    fill_random(&mut buf);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ManualClock(AtomicU64);

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn password(validity_ms: u64) -> (Arc<ManualClock>, SessionPassword) {
        let clock = Arc::new(ManualClock(AtomicU64::new(1_000)));
        let pw = SessionPassword::new(clock.clone(), Duration::from_millis(validity_ms), None);
        (clock, pw)
    }

    #[test]
    fn generated_password_is_32_bit_and_stable() {
        let (_clock, pw) = password(10_000);
        let first = pw.current();
        assert!(first <= PASSWORD_MASK);
        assert_eq!(pw.current(), first);
        assert!(pw.verify(first));
        assert!(!pw.verify(first ^ 1));
        assert_eq!(pw.expires_at_ms(), 11_000);
    }

    #[test]
    fn expiry_rolls_lazily() {
        let (clock, pw) = password(10_000);
        pw.current();
        clock.0.store(11_000, Ordering::Relaxed);
        pw.current();
        assert_eq!(pw.expires_at_ms(), 21_000);
    }

    #[test]
    fn regenerate_extends_expiry() {
        let (clock, pw) = password(10_000);
        pw.current();
        clock.0.store(5_000, Ordering::Relaxed);
        let value = pw.regenerate();
        assert_eq!(pw.current(), value);
        assert_eq!(pw.expires_at_ms(), 15_000);
    }

    #[test]
    fn fixed_password_never_expires() {
        let clock = Arc::new(ManualClock(AtomicU64::new(u64::MAX - 1)));
        let pw = SessionPassword::new(clock, Duration::from_secs(1), Some(0xDEAD_BEEF_0000));
        assert!(pw.verify(0xDEAD_BEEF_0000));
    }

    #[test]
    fn random_fill_covers_odd_lengths() {
        let mut buf = [0u8; 13];
        fill_random(&mut buf);
        // 13 zero bytes from a random source is practically impossible.
        assert!(buf.iter().any(|&b| b != 0));
    }
}
