//! Memory collectors.
//!
//! Native memory statistics are comparatively expensive, so every backend
//! goes through [`ThrottledMemory`]: a sample is taken only once the cached
//! one is at least the refresh interval old, and queries inside the window
//! return the identical cached snapshot.

pub mod linux;
pub mod windows;

pub use linux::LinuxMemoryCollector;
pub use windows::{PagingFileUsage, PerformanceInfo, PerformanceSource, WindowsMemoryCollector};

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::model::MemorySnapshot;
use crate::util::now_epoch_millis;

/// One successful native sample, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySample {
    pub total: u64,
    pub available: u64,
    pub swap_total: u64,
    /// Only for sources that report swap usage together with the totals.
    pub swap_used: Option<u64>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: MemorySnapshot,
    last_update: Option<Instant>,
}

/// Cached memory snapshot with a minimum re-sampling interval.
///
/// The snapshot and its timestamp sit behind one mutex and are replaced
/// together. The lock is held while sampling, so concurrent callers inside
/// the window never trigger a second native call.
#[derive(Debug)]
pub struct ThrottledMemory {
    state: Mutex<MemoryState>,
    min_interval: Duration,
}

impl ThrottledMemory {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Calls `sample` if the cached snapshot is stale.
    ///
    /// A `None` sample keeps the previous snapshot and timestamp, so the next
    /// call tries again. Returns whether the snapshot was replaced.
    pub fn refresh_with(&self, sample: impl FnOnce() -> Option<MemorySample>) -> bool {
        let mut state = self.lock();
        let now = Instant::now();
        if let Some(last) = state.last_update
            && now.duration_since(last) < self.min_interval
        {
            trace!("memory snapshot still fresh");
            return false;
        }
        let Some(sample) = sample() else {
            return false;
        };
        state.snapshot.total = sample.total;
        state.snapshot.available = sample.available;
        state.snapshot.swap_total = sample.swap_total;
        if let Some(used) = sample.swap_used {
            state.snapshot.swap_used = used;
        }
        state.snapshot.updated_at_ms = now_epoch_millis();
        state.last_update = Some(now);
        true
    }

    /// Replaces swap used with `compute(swap_total)`; `None` leaves it unchanged.
    pub fn update_swap_used(&self, compute: impl FnOnce(u64) -> Option<u64>) {
        let mut state = self.lock();
        if let Some(used) = compute(state.snapshot.swap_total) {
            state.snapshot.swap_used = used;
        }
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        self.lock().snapshot
    }
}

impl Default for ThrottledMemory {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_MEMORY_REFRESH_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sample(total: u64) -> MemorySample {
        MemorySample {
            total,
            available: total / 2,
            swap_total: 1024,
            swap_used: None,
        }
    }

    #[test]
    fn test_refresh_inside_window_is_cached() {
        let memory = ThrottledMemory::new(Duration::from_secs(60));
        assert!(memory.refresh_with(|| Some(sample(4096))));
        let first = memory.snapshot();

        let calls = Cell::new(0);
        let refreshed = memory.refresh_with(|| {
            calls.set(calls.get() + 1);
            Some(sample(8192))
        });

        assert!(!refreshed);
        assert_eq!(calls.get(), 0);
        assert_eq!(memory.snapshot(), first);
    }

    #[test]
    fn test_refresh_after_window() {
        let memory = ThrottledMemory::new(Duration::from_millis(20));
        memory.refresh_with(|| Some(sample(4096)));
        std::thread::sleep(Duration::from_millis(30));
        assert!(memory.refresh_with(|| Some(sample(8192))));
        assert_eq!(memory.snapshot().total, 8192);
    }

    #[test]
    fn test_zero_interval_always_samples() {
        let memory = ThrottledMemory::new(Duration::ZERO);
        assert!(memory.refresh_with(|| Some(sample(1))));
        assert!(memory.refresh_with(|| Some(sample(2))));
        assert_eq!(memory.snapshot().total, 2);
    }

    #[test]
    fn test_failed_sample_keeps_previous() {
        let memory = ThrottledMemory::new(Duration::ZERO);
        memory.refresh_with(|| Some(sample(4096)));
        let before = memory.snapshot();

        assert!(!memory.refresh_with(|| None));
        assert_eq!(memory.snapshot(), before);
        assert!(before.updated_at_ms > 0);
    }

    #[test]
    fn test_never_sampled() {
        let memory = ThrottledMemory::default();
        assert!(!memory.refresh_with(|| None));
        assert_eq!(memory.snapshot(), MemorySnapshot::default());
    }

    #[test]
    fn test_update_swap_used() {
        let memory = ThrottledMemory::new(Duration::ZERO);
        memory.refresh_with(|| Some(sample(4096)));

        memory.update_swap_used(|total| Some(total / 4));
        assert_eq!(memory.snapshot().swap_used, 256);

        memory.update_swap_used(|_| None);
        assert_eq!(memory.snapshot().swap_used, 256);
    }

    #[test]
    fn test_sample_with_swap_used() {
        let memory = ThrottledMemory::new(Duration::ZERO);
        memory.refresh_with(|| {
            Some(MemorySample {
                swap_used: Some(100),
                ..sample(4096)
            })
        });
        assert_eq!(memory.snapshot().swap_used, 100);

        // a sample without swap usage leaves the last value in place
        memory.refresh_with(|| Some(sample(4096)));
        assert_eq!(memory.snapshot().swap_used, 100);
    }
}
