//! Memory collector for Windows.
//!
//! Totals come from `GetPerformanceInfo` page counts. Swap usage comes from
//! the `_Total` instance of the raw paging-file performance counter, queried
//! through PowerShell CIM.

use std::time::Duration;

use tracing::{debug, error};

use super::{MemorySample, ThrottledMemory};
use crate::collector::traits::MemoryCollector;
use crate::model::MemorySnapshot;
use crate::source::file::split_key_value;

/// Page counts from `PERFORMANCE_INFORMATION`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceInfo {
    pub page_size: u64,
    pub physical_total: u64,
    pub physical_available: u64,
    pub commit_limit: u64,
}

impl PerformanceInfo {
    /// Converts page counts into byte totals.
    ///
    /// Swap total is the commit limit beyond physical memory; a commit limit
    /// below physical total yields zero.
    pub fn to_sample(&self) -> MemorySample {
        MemorySample {
            total: self.page_size.saturating_mul(self.physical_total),
            available: self.page_size.saturating_mul(self.physical_available),
            swap_total: self
                .page_size
                .saturating_mul(self.commit_limit.saturating_sub(self.physical_total)),
            swap_used: None,
        }
    }
}

/// Raw `PercentUsage` / `PercentUsage_Base` counter pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingFileUsage {
    pub usage: u64,
    pub base: u64,
}

impl PagingFileUsage {
    /// Bytes of swap in use given the swap total; `None` for a zero base.
    ///
    /// The counters are sampled separately from the totals, so the result may
    /// exceed `swap_total`; it is not clamped.
    pub fn swap_used(&self, swap_total: u64) -> Option<u64> {
        if self.base == 0 {
            return None;
        }
        let used = swap_total as u128 * self.usage as u128 / self.base as u128;
        Some(u64::try_from(used).unwrap_or(u64::MAX))
    }
}

/// Native sources behind the Windows memory collector.
pub trait PerformanceSource: Send + Sync {
    /// `GetPerformanceInfo`; the error is the `GetLastError` code.
    fn performance_info(&self) -> Result<PerformanceInfo, u32>;

    /// Paging-file counters, `None` when the query returned nothing.
    fn paging_file_usage(&self) -> Option<PagingFileUsage>;
}

/// Parses `Format-List` output of the paging-file counter query:
///
/// ```text
/// PercentUsage      : 12345
/// PercentUsage_Base : 262144
/// ```
pub fn parse_paging_file_usage(lines: &[String]) -> Option<PagingFileUsage> {
    let mut usage = None;
    let mut base = None;
    for line in lines {
        let Some((key, value)) = split_key_value(line, ":") else {
            continue;
        };
        let value = value.trim().parse::<u64>().ok();
        match key.trim() {
            "PercentUsage" => usage = usage.or(value),
            "PercentUsage_Base" => base = base.or(value),
            _ => {}
        }
    }
    Some(PagingFileUsage {
        usage: usage?,
        base: base?,
    })
}

/// Reads memory through a [`PerformanceSource`].
pub struct WindowsMemoryCollector<P: PerformanceSource> {
    source: P,
    memory: ThrottledMemory,
}

impl<P: PerformanceSource> WindowsMemoryCollector<P> {
    pub fn new(source: P, min_interval: Duration) -> Self {
        Self {
            source,
            memory: ThrottledMemory::new(min_interval),
        }
    }
}

impl<P: PerformanceSource> MemoryCollector for WindowsMemoryCollector<P> {
    fn refresh(&self) {
        self.memory
            .refresh_with(|| match self.source.performance_info() {
                Ok(info) => Some(info.to_sample()),
                Err(code) => {
                    error!(code, "failed to get performance info");
                    None
                }
            });
    }

    fn refresh_swap_used(&self) {
        self.refresh();
        self.memory.update_swap_used(|swap_total| {
            let usage = self.source.paging_file_usage();
            if usage.is_none() {
                debug!("no paging file usage data");
            }
            usage?.swap_used(swap_total)
        });
    }

    fn snapshot(&self) -> MemorySnapshot {
        self.memory.snapshot()
    }
}

#[cfg(windows)]
pub use system::SystemPerformanceSource;

#[cfg(windows)]
mod system {
    use std::mem;

    use windows_sys::Win32::Foundation::GetLastError;
    use windows_sys::Win32::System::ProcessStatus::{GetPerformanceInfo, PERFORMANCE_INFORMATION};

    use super::{PagingFileUsage, PerformanceInfo, PerformanceSource, parse_paging_file_usage};
    use crate::source::command::CommandRunner;

    const POWERSHELL: &str = "powershell";
    const PAGING_FILE_QUERY: &str = "Get-CimInstance -ClassName Win32_PerfRawData_PerfOS_PagingFile \
         -Filter \"Name='_Total'\" | Format-List PercentUsage,PercentUsage_Base";

    /// Talks to the running system.
    pub struct SystemPerformanceSource<R: CommandRunner> {
        runner: R,
    }

    impl<R: CommandRunner> SystemPerformanceSource<R> {
        pub fn new(runner: R) -> Self {
            Self { runner }
        }
    }

    impl<R: CommandRunner> PerformanceSource for SystemPerformanceSource<R> {
        fn performance_info(&self) -> Result<PerformanceInfo, u32> {
            // SAFETY: PERFORMANCE_INFORMATION is plain data; `cb` carries its size.
            unsafe {
                let mut info: PERFORMANCE_INFORMATION = mem::zeroed();
                let size = mem::size_of::<PERFORMANCE_INFORMATION>() as u32;
                info.cb = size;
                if GetPerformanceInfo(&mut info, size) == 0 {
                    return Err(GetLastError());
                }
                Ok(PerformanceInfo {
                    page_size: info.PageSize as u64,
                    physical_total: info.PhysicalTotal as u64,
                    physical_available: info.PhysicalAvailable as u64,
                    commit_limit: info.CommitLimit as u64,
                })
            }
        }

        fn paging_file_usage(&self) -> Option<PagingFileUsage> {
            let args = ["-NoProfile", "-NonInteractive", "-Command", PAGING_FILE_QUERY];
            let lines = match self.runner.execute(POWERSHELL, &args) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to query paging file usage");
                    return None;
                }
            };
            parse_paging_file_usage(&lines)
        }
    }
}
