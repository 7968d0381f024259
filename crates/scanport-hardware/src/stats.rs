use crate::types::ScannerStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotone per-backend counters.
///
/// Only re-initialization resets them.
#[derive(Debug, Default)]
pub struct Statistics {
    frames_received: AtomicU64,
    errors: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_errors(&self, count: u64) {
        self.errors.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.frames_received.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScannerStats {
        ScannerStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = Statistics::new();
        stats.record_frame();
        stats.record_frame();
        stats.record_error();
        stats.record_errors(2);

        assert_eq!(
            stats.snapshot(),
            ScannerStats {
                frames_received: 2,
                errors: 3
            }
        );

        stats.reset();
        assert_eq!(stats.snapshot(), ScannerStats::default());
    }
}
