//! Entry point: the collectors for the build target behind one handle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collector::traits::{CpuCollector, DisplayCollector, MemoryCollector, NetworkCollector};
use crate::config::ProbeConfig;
use crate::model::{CpuIdentity, CpuTicks, Display, MemorySnapshot, NetworkParams};
use crate::util::now_epoch_secs;

/// Everything the collectors report, gathered at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareSnapshot {
    /// Epoch seconds at which the snapshot was taken.
    pub timestamp: u64,
    pub os: String,
    pub cpu: CpuIdentity,
    pub boot_time: u64,
    pub uptime: u64,
    pub system_ticks: CpuTicks,
    pub processor_ticks: Vec<CpuTicks>,
    /// 1, 5 and 15 minute averages; -1.0 where unavailable.
    pub load_average: Vec<f64>,
    pub memory: MemorySnapshot,
    pub displays: Vec<Display>,
    pub network: NetworkParams,
}

/// Hardware and OS information for the running system.
///
/// ```no_run
/// use hwprobe_core::{ProbeConfig, SystemInfo};
///
/// let system = SystemInfo::new(ProbeConfig::default());
/// println!("{}", system.cpu().identity().name);
/// println!("{} bytes available", system.memory().available());
/// ```
pub struct SystemInfo {
    cpu: Box<dyn CpuCollector>,
    memory: Box<dyn MemoryCollector>,
    displays: Box<dyn DisplayCollector>,
    network: Box<dyn NetworkCollector>,
}

impl SystemInfo {
    /// Builds the collectors for the current platform.
    ///
    /// Domains the platform has no backend for report zero or empty values.
    pub fn new(config: ProbeConfig) -> Self {
        debug!(os = std::env::consts::OS, ?config, "building collectors");
        Self::from_parts(
            platform::cpu(&config),
            platform::memory(&config),
            platform::displays(&config),
            platform::network(&config),
        )
    }

    /// Assembles a `SystemInfo` from explicit collectors.
    pub fn from_parts(
        cpu: Box<dyn CpuCollector>,
        memory: Box<dyn MemoryCollector>,
        displays: Box<dyn DisplayCollector>,
        network: Box<dyn NetworkCollector>,
    ) -> Self {
        Self {
            cpu,
            memory,
            displays,
            network,
        }
    }

    pub fn cpu(&self) -> &dyn CpuCollector {
        self.cpu.as_ref()
    }

    pub fn memory(&self) -> &dyn MemoryCollector {
        self.memory.as_ref()
    }

    pub fn displays(&self) -> &dyn DisplayCollector {
        self.displays.as_ref()
    }

    pub fn network(&self) -> &dyn NetworkCollector {
        self.network.as_ref()
    }

    /// Queries every collector once.
    pub fn snapshot(&self) -> HardwareSnapshot {
        self.memory.refresh_swap_used();
        HardwareSnapshot {
            timestamp: now_epoch_secs(),
            os: std::env::consts::OS.to_string(),
            cpu: self.cpu.identity().clone(),
            boot_time: self.cpu.boot_time(),
            uptime: self.cpu.system_uptime(),
            system_ticks: self.cpu.system_cpu_load_ticks(),
            processor_ticks: self.cpu.processor_cpu_load_ticks(),
            load_average: self.cpu.system_load_average(3).unwrap_or_default(),
            memory: self.memory.snapshot(),
            displays: self.displays.displays(),
            network: self.network.params(),
        }
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::*;
    use crate::collector::network::SystemResolver;
    use crate::collector::{
        LinuxCpuCollector, LinuxMemoryCollector, LinuxNetworkCollector, XrandrDisplayCollector,
    };
    use crate::source::{RealFs, SystemCommandRunner};

    pub(super) fn cpu(config: &ProbeConfig) -> Box<dyn CpuCollector> {
        Box::new(LinuxCpuCollector::new(RealFs::new(), &config.proc_path))
    }

    pub(super) fn memory(config: &ProbeConfig) -> Box<dyn MemoryCollector> {
        Box::new(LinuxMemoryCollector::new(
            RealFs::new(),
            &config.proc_path,
            config.memory_refresh_interval(),
        ))
    }

    pub(super) fn displays(config: &ProbeConfig) -> Box<dyn DisplayCollector> {
        Box::new(XrandrDisplayCollector::new(SystemCommandRunner::new(
            config.command_timeout(),
        )))
    }

    pub(super) fn network(config: &ProbeConfig) -> Box<dyn NetworkCollector> {
        Box::new(LinuxNetworkCollector::new(
            RealFs::new(),
            &config.proc_path,
            SystemResolver::new(),
            &config.resolv_conf_path,
        ))
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::*;
    use crate::collector::cpu::mach::SystemMachHost;
    use crate::collector::network::SystemResolver;
    use crate::collector::{MacCpuCollector, MacNetworkCollector, Unsupported};
    use crate::source::{RealFs, SystemCommandRunner};

    pub(super) fn cpu(config: &ProbeConfig) -> Box<dyn CpuCollector> {
        let runner = SystemCommandRunner::new(config.command_timeout());
        Box::new(MacCpuCollector::new(SystemMachHost::new(), &runner))
    }

    pub(super) fn memory(_config: &ProbeConfig) -> Box<dyn MemoryCollector> {
        Box::new(Unsupported::new("memory"))
    }

    pub(super) fn displays(_config: &ProbeConfig) -> Box<dyn DisplayCollector> {
        Box::new(Unsupported::new("display"))
    }

    pub(super) fn network(config: &ProbeConfig) -> Box<dyn NetworkCollector> {
        Box::new(MacNetworkCollector::new(
            RealFs::new(),
            SystemCommandRunner::new(config.command_timeout()),
            SystemResolver::new(),
            &config.resolv_conf_path,
        ))
    }
}

#[cfg(windows)]
mod platform {
    use super::*;
    use crate::collector::memory::windows::SystemPerformanceSource;
    use crate::collector::{Unsupported, WindowsMemoryCollector};
    use crate::source::SystemCommandRunner;

    pub(super) fn cpu(_config: &ProbeConfig) -> Box<dyn CpuCollector> {
        Box::new(Unsupported::new("cpu"))
    }

    pub(super) fn memory(config: &ProbeConfig) -> Box<dyn MemoryCollector> {
        let source =
            SystemPerformanceSource::new(SystemCommandRunner::new(config.command_timeout()));
        Box::new(WindowsMemoryCollector::new(
            source,
            config.memory_refresh_interval(),
        ))
    }

    pub(super) fn displays(_config: &ProbeConfig) -> Box<dyn DisplayCollector> {
        Box::new(Unsupported::new("display"))
    }

    pub(super) fn network(_config: &ProbeConfig) -> Box<dyn NetworkCollector> {
        Box::new(Unsupported::new("network"))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
mod platform {
    use super::*;
    use crate::collector::Unsupported;

    pub(super) fn cpu(_config: &ProbeConfig) -> Box<dyn CpuCollector> {
        Box::new(Unsupported::new("cpu"))
    }

    pub(super) fn memory(_config: &ProbeConfig) -> Box<dyn MemoryCollector> {
        Box::new(Unsupported::new("memory"))
    }

    pub(super) fn displays(_config: &ProbeConfig) -> Box<dyn DisplayCollector> {
        Box::new(Unsupported::new("display"))
    }

    pub(super) fn network(_config: &ProbeConfig) -> Box<dyn NetworkCollector> {
        Box::new(Unsupported::new("network"))
    }
}
