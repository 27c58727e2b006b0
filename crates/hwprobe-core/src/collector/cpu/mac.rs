//! CPU collector for macOS.

use tracing::{debug, error};

use super::mach::MachHost;
use super::{
    CPU_STATE_IDLE, CPU_STATE_NICE, CPU_STATE_SYSTEM, CPU_STATE_USER, check_load_average_count,
    mark_unfilled_load_average, reshape_processor_ticks, resolve_boot_time,
};
use crate::collector::traits::CpuCollector;
use crate::error::ProbeError;
use crate::model::{CpuIdentity, CpuTicks, TickType};
use crate::source::command::CommandRunner;
use crate::source::parse::first_digit_run;
use crate::util::now_epoch_secs;

/// Text fallback for the boot time when the binary sysctl fails.
const BOOT_TIME_COMMAND: &str = "sysctl -n kern.boottime";

/// Reads CPU state through Mach host calls and sysctl.
pub struct MacCpuCollector<H: MachHost> {
    host: H,
    identity: CpuIdentity,
    boot_time: u64,
}

impl<H: MachHost> MacCpuCollector<H> {
    /// Creates the collector, reading identity and boot time once.
    ///
    /// `runner` is only used for the boot time text fallback.
    pub fn new(host: H, runner: &dyn CommandRunner) -> Self {
        let identity = read_identity(&host);
        let boot_time = resolve_boot_time(
            || host.boot_time_secs().and_then(|s| u64::try_from(s).ok()),
            || boot_time_from_text(&runner.first_answer(BOOT_TIME_COMMAND)),
            now_epoch_secs(),
        );
        debug!(
            boot_time,
            logical = identity.logical_processor_count,
            "initialized macOS CPU collector"
        );
        Self {
            host,
            identity,
            boot_time,
        }
    }
}

/// Extracts the seconds from `sysctl -n kern.boottime` text, e.g.
/// `{ sec = 1500000000, usec = 0 } Fri Jul 14 02:40:00 2017`. The seconds
/// are the first run of digits.
pub fn boot_time_from_text(text: &str) -> Option<u64> {
    first_digit_run(text)?.parse().ok()
}

fn read_identity(host: &impl MachHost) -> CpuIdentity {
    let decimal = |name: &str| -> String {
        match host.sysctl_int(name) {
            Some(v) if v >= 0 => v.to_string(),
            _ => String::new(),
        }
    };

    let signature = host.sysctl_int("machdep.cpu.signature").unwrap_or(0) as u32 as u64;
    let feature_bits = host.sysctl_long("machdep.cpu.feature_bits").unwrap_or(0) as u64;
    let processor_id = signature | ((feature_bits & 0xffff_ffff) << 32);

    let count = |name: &str| -> usize {
        host.sysctl_int(name)
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(1)
    };

    CpuIdentity {
        vendor: host.sysctl_string("machdep.cpu.vendor").unwrap_or_default(),
        name: host
            .sysctl_string("machdep.cpu.brand_string")
            .unwrap_or_default(),
        stepping: decimal("machdep.cpu.stepping"),
        model: decimal("machdep.cpu.model"),
        family: decimal("machdep.cpu.family"),
        processor_id: CpuIdentity::format_processor_id(processor_id),
        cpu64bit: host.sysctl_int("hw.cpu64bit_capable").unwrap_or(0) != 0,
        logical_processor_count: count("hw.logicalcpu"),
        physical_processor_count: count("hw.physicalcpu"),
    }
}

impl<H: MachHost> CpuCollector for MacCpuCollector<H> {
    fn identity(&self) -> &CpuIdentity {
        &self.identity
    }

    fn boot_time(&self) -> u64 {
        self.boot_time
    }

    fn system_cpu_load_ticks(&self) -> CpuTicks {
        let mut ticks = CpuTicks::default();
        match self.host.host_cpu_load() {
            Ok(states) => {
                ticks[TickType::User] = states[CPU_STATE_USER] as u64;
                ticks[TickType::Nice] = states[CPU_STATE_NICE] as u64;
                ticks[TickType::System] = states[CPU_STATE_SYSTEM] as u64;
                ticks[TickType::Idle] = states[CPU_STATE_IDLE] as u64;
                // IOWait, IRQ, SoftIRQ and Steal are not reported separately
            }
            Err(code) => error!(code, "failed to get system CPU ticks"),
        }
        ticks
    }

    fn processor_cpu_load_ticks(&self) -> Vec<CpuTicks> {
        let rows = self.identity.logical_processor_count;
        match self.host.host_processor_load() {
            Ok(load) => reshape_processor_ticks(&load.ticks, load.cpu_count, rows),
            Err(code) => {
                error!(code, "failed to get per-processor CPU ticks");
                vec![CpuTicks::default(); rows]
            }
        }
    }

    fn system_load_average(&self, nelem: usize) -> Result<Vec<f64>, ProbeError> {
        check_load_average_count(nelem)?;
        let mut average = vec![0.0; nelem];
        let filled = self.host.load_average(&mut average);
        if filled < nelem as i32 {
            mark_unfilled_load_average(&mut average, filled);
        }
        Ok(average)
    }
}
