//! Wall-clock adapter.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::Clock;

/// [`Clock`] backed by the system time.  A clock set before the epoch reads
/// as zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn after_2020() {
        const EPOCH_2020_MS: u64 = 1_577_836_800_000;
        assert!(SystemClock.now_ms() > EPOCH_2020_MS);
    }
}
