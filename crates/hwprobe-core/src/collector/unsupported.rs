//! Fallback collectors for platforms without a native implementation.
//!
//! Every query returns zero or empty values. The first query per collector
//! logs at debug level so a missing backend is visible without being noisy.

use std::sync::Once;

use tracing::debug;

use crate::collector::cpu::check_load_average_count;
use crate::collector::traits::{CpuCollector, DisplayCollector, MemoryCollector, NetworkCollector};
use crate::error::ProbeError;
use crate::model::{CpuIdentity, CpuTicks, Display, MemorySnapshot};

/// Stands in for any collector the build target has no backend for.
#[derive(Debug)]
pub struct Unsupported {
    domain: &'static str,
    identity: CpuIdentity,
    logged: Once,
}

impl Unsupported {
    /// `domain` names the metric domain in the log line, e.g. "display".
    pub fn new(domain: &'static str) -> Self {
        Self {
            domain,
            identity: CpuIdentity {
                logical_processor_count: 1,
                physical_processor_count: 1,
                ..Default::default()
            },
            logged: Once::new(),
        }
    }

    fn note(&self) {
        self.logged.call_once(|| {
            debug!(
                domain = self.domain,
                os = std::env::consts::OS,
                "collector not supported on this platform"
            );
        });
    }
}

impl CpuCollector for Unsupported {
    fn identity(&self) -> &CpuIdentity {
        self.note();
        &self.identity
    }

    fn boot_time(&self) -> u64 {
        self.note();
        0
    }

    fn system_cpu_load_ticks(&self) -> CpuTicks {
        self.note();
        CpuTicks::default()
    }

    fn processor_cpu_load_ticks(&self) -> Vec<CpuTicks> {
        self.note();
        vec![CpuTicks::default(); self.identity.logical_processor_count]
    }

    fn system_load_average(&self, nelem: usize) -> Result<Vec<f64>, ProbeError> {
        check_load_average_count(nelem)?;
        self.note();
        Ok(vec![-1.0; nelem])
    }

    fn system_uptime(&self) -> u64 {
        self.note();
        0
    }
}

impl MemoryCollector for Unsupported {
    fn refresh(&self) {
        self.note();
    }

    fn refresh_swap_used(&self) {
        self.note();
    }

    fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot::default()
    }
}

impl DisplayCollector for Unsupported {
    fn displays(&self) -> Vec<Display> {
        self.note();
        Vec::new()
    }
}

impl NetworkCollector for Unsupported {
    fn host_name(&self) -> String {
        self.note();
        String::new()
    }

    fn domain_name(&self) -> String {
        self.note();
        String::new()
    }

    fn dns_servers(&self) -> Vec<String> {
        self.note();
        Vec::new()
    }

    fn ipv4_default_gateway(&self) -> String {
        self.note();
        String::new()
    }

    fn ipv6_default_gateway(&self) -> String {
        self.note();
        String::new()
    }
}
