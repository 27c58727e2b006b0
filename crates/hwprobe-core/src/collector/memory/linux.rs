//! Memory collector for Linux, backed by `/proc/meminfo`.
//!
//! meminfo reports kB, so the page model is applied with a 1024-byte page.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use super::{MemorySample, ThrottledMemory};
use crate::collector::procfs::{MemInfo, parse_meminfo};
use crate::collector::traits::MemoryCollector;
use crate::model::MemorySnapshot;
use crate::source::FileSystemExt;
use crate::source::traits::FileSystem;

const KB: u64 = 1024;

pub struct LinuxMemoryCollector<F: FileSystem> {
    fs: F,
    meminfo_path: PathBuf,
    memory: ThrottledMemory,
}

impl<F: FileSystem> LinuxMemoryCollector<F> {
    pub fn new(fs: F, proc_path: impl AsRef<Path>, min_interval: Duration) -> Self {
        Self {
            fs,
            meminfo_path: proc_path.as_ref().join("meminfo"),
            memory: ThrottledMemory::new(min_interval),
        }
    }

    fn read_meminfo(&self) -> Option<MemInfo> {
        let fields = self.fs.key_value_map(&self.meminfo_path, ":");
        match parse_meminfo(&fields) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(path = %self.meminfo_path.display(), error = %e, "failed to parse meminfo");
                None
            }
        }
    }
}

/// Converts meminfo kB fields into a byte sample.
pub fn sample_from_meminfo(info: &MemInfo) -> MemorySample {
    MemorySample {
        total: info.mem_total.saturating_mul(KB),
        available: info.available().saturating_mul(KB),
        swap_total: info.swap_total.saturating_mul(KB),
        swap_used: Some(info.swap_total.saturating_sub(info.swap_free).saturating_mul(KB)),
    }
}

impl<F: FileSystem> MemoryCollector for LinuxMemoryCollector<F> {
    fn refresh(&self) {
        self.memory
            .refresh_with(|| self.read_meminfo().map(|info| sample_from_meminfo(&info)));
    }

    /// meminfo carries swap usage alongside the totals, so a refresh is all
    /// it takes.
    fn refresh_swap_used(&self) {
        self.refresh();
    }

    fn snapshot(&self) -> MemorySnapshot {
        self.memory.snapshot()
    }
}
