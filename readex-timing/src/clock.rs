use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of wall-clock timestamps, in unix seconds
pub trait Timer: Clone + Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Timer for WallClock {
    fn now(&self) -> f64 {
        let now = chrono::Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn starting_at(secs: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(secs.to_bits())),
        }
    }

    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(0.0)
    }
}

impl Timer for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::starting_at(100.0);
        let other = clock.clone();
        clock.advance(2.5);
        assert_eq!(other.now(), 102.5);
        other.set(7.0);
        assert_eq!(clock.now(), 7.0);
    }

    #[test]
    fn wall_clock_is_after_2020() {
        assert!(WallClock.now() > 1_577_836_800.0);
    }
}
