//! Capability traits, one per metric domain.
//!
//! `SystemInfo` holds one boxed implementation of each, chosen for the build
//! target. All methods are infallible except where a caller can pass an
//! out-of-range argument.

use crate::error::ProbeError;
use crate::model::{CpuIdentity, CpuTicks, Display, MemorySnapshot, NetworkParams};
use crate::util::now_epoch_secs;

/// Processor identity, tick counters and load.
pub trait CpuCollector: Send + Sync {
    /// Identity read at construction.
    fn identity(&self) -> &CpuIdentity;

    /// Seconds since the epoch at which the system booted.
    fn boot_time(&self) -> u64;

    /// Machine-wide cumulative ticks; all zero if the source failed.
    fn system_cpu_load_ticks(&self) -> CpuTicks;

    /// Per-core cumulative ticks, one row per logical processor.
    fn processor_cpu_load_ticks(&self) -> Vec<CpuTicks>;

    /// The 1, 5 and 15 minute load averages, truncated to `nelem` entries.
    ///
    /// Entries the platform could not supply are -1.0. `nelem` must be in
    /// `1..=3`.
    fn system_load_average(&self, nelem: usize) -> Result<Vec<f64>, ProbeError>;

    /// Seconds since boot.
    fn system_uptime(&self) -> u64 {
        now_epoch_secs().saturating_sub(self.boot_time())
    }
}

/// Physical memory and swap, re-sampled at most once per refresh interval.
pub trait MemoryCollector: Send + Sync {
    /// Re-samples totals and availability if the cached values are stale.
    fn refresh(&self);

    /// Refreshes, then updates swap used. Swap used keeps its previous value
    /// when the platform has no data.
    fn refresh_swap_used(&self);

    /// Copy of the cached snapshot without sampling.
    fn snapshot(&self) -> MemorySnapshot;

    fn total(&self) -> u64 {
        self.refresh();
        self.snapshot().total
    }

    fn available(&self) -> u64 {
        self.refresh();
        self.snapshot().available
    }

    fn swap_total(&self) -> u64 {
        self.refresh();
        self.snapshot().swap_total
    }

    fn swap_used(&self) -> u64 {
        self.refresh_swap_used();
        self.snapshot().swap_used
    }
}

/// Attached displays.
pub trait DisplayCollector: Send + Sync {
    /// One entry per display with a complete EDID block, re-read on every call.
    fn displays(&self) -> Vec<Display>;
}

/// Host naming and routing parameters. Every value is re-resolved per call
/// and is empty when it cannot be determined.
pub trait NetworkCollector: Send + Sync {
    fn host_name(&self) -> String;

    fn domain_name(&self) -> String;

    fn dns_servers(&self) -> Vec<String>;

    fn ipv4_default_gateway(&self) -> String;

    fn ipv6_default_gateway(&self) -> String;

    /// All parameters at once.
    fn params(&self) -> NetworkParams {
        NetworkParams {
            host_name: self.host_name(),
            domain_name: self.domain_name(),
            dns_servers: self.dns_servers(),
            ipv4_default_gateway: self.ipv4_default_gateway(),
            ipv6_default_gateway: self.ipv6_default_gateway(),
        }
    }
}
