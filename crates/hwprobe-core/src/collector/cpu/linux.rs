//! CPU collector for Linux, backed by procfs.
//!
//! Reads:
//! - `/proc/cpuinfo` — identity and processor counts (once)
//! - `/proc/stat` — `btime` and the aggregate and per-core tick lines
//! - `/proc/uptime` — boot time fallback
//! - `/proc/loadavg` — load averages

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{check_load_average_count, resolve_boot_time};
use crate::collector::procfs::{
    CpuInfo, GlobalStat, parse_cpuinfo, parse_global_stat, parse_loadavg, parse_uptime,
};
use crate::collector::traits::CpuCollector;
use crate::error::ProbeError;
use crate::model::{CpuIdentity, CpuTicks};
use crate::source::FileSystemExt;
use crate::source::traits::FileSystem;
use crate::util::now_epoch_secs;

/// `/proc/cpuinfo` flag names in CPUID leaf 1 EDX bit order.
const EDX_FEATURE_FLAGS: &[(&str, u32)] = &[
    ("fpu", 0),
    ("vme", 1),
    ("de", 2),
    ("pse", 3),
    ("tsc", 4),
    ("msr", 5),
    ("pae", 6),
    ("mce", 7),
    ("cx8", 8),
    ("apic", 9),
    ("sep", 11),
    ("mtrr", 12),
    ("pge", 13),
    ("mca", 14),
    ("cmov", 15),
    ("pat", 16),
    ("pse36", 17),
    ("pn", 18),
    ("clflush", 19),
    ("dts", 21),
    ("acpi", 22),
    ("mmx", 23),
    ("fxsr", 24),
    ("sse", 25),
    ("sse2", 26),
    ("ss", 27),
    ("ht", 28),
    ("tm", 29),
    ("ia64", 30),
    ("pbe", 31),
];

/// Reads CPU state from procfs.
pub struct LinuxCpuCollector<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
    identity: CpuIdentity,
    boot_time: u64,
}

impl<F: FileSystem> LinuxCpuCollector<F> {
    /// Creates the collector, reading identity and boot time once.
    pub fn new(fs: F, proc_path: impl AsRef<Path>) -> Self {
        let proc_path = proc_path.as_ref().to_path_buf();

        let cpuinfo_lines = fs.read_lines(&proc_path.join("cpuinfo"));
        let cpuinfo = if cpuinfo_lines.is_empty() {
            CpuInfo::default()
        } else {
            parse_cpuinfo(&cpuinfo_lines)
        };
        let stat = read_stat(&fs, &proc_path);
        let per_core_lines = stat
            .as_ref()
            .map(|s| s.cpus.iter().filter(|c| c.cpu_id.is_some()).count())
            .unwrap_or(0);
        let identity = identity_from_cpuinfo(&cpuinfo, per_core_lines);

        let now = now_epoch_secs();
        let boot_time = resolve_boot_time(
            || stat.as_ref().map(|s| s.btime),
            || {
                let tokens = fs.first_line_tokens(&proc_path.join("uptime"));
                let uptime = parse_uptime(&tokens).ok()?;
                Some(now.saturating_sub(uptime as u64))
            },
            now,
        );

        debug!(
            boot_time,
            logical = identity.logical_processor_count,
            physical = identity.physical_processor_count,
            "initialized Linux CPU collector"
        );
        Self {
            fs,
            proc_path,
            identity,
            boot_time,
        }
    }
}

fn read_stat<F: FileSystem>(fs: &F, proc_path: &Path) -> Option<GlobalStat> {
    let path = proc_path.join("stat");
    let lines = fs.read_lines(&path);
    if lines.is_empty() {
        return None;
    }
    match parse_global_stat(&lines) {
        Ok(stat) => Some(stat),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse stat");
            None
        }
    }
}

/// Builds the processor identity from parsed cpuinfo.
///
/// `per_core_lines` is the number of `cpuN` lines in `/proc/stat`, used as
/// the logical count when cpuinfo has no `processor` entries.
pub fn identity_from_cpuinfo(info: &CpuInfo, per_core_lines: usize) -> CpuIdentity {
    let decimal = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();

    let logical = match (info.logical_count, per_core_lines) {
        (0, 0) => 1,
        (0, n) => n,
        (n, _) => n,
    };
    // without topology entries every logical processor counts as a core
    let physical = if info.physical_count > 0 {
        info.physical_count
    } else {
        logical
    };

    let signature = x86_signature(
        info.stepping.unwrap_or(0),
        info.model.unwrap_or(0),
        info.family.unwrap_or(0),
    );
    let processor_id = ((edx_feature_bits(&info.flags) as u64) << 32) | signature as u64;

    CpuIdentity {
        vendor: info.vendor.clone(),
        name: info.name.clone(),
        stepping: decimal(info.stepping),
        model: decimal(info.model),
        family: decimal(info.family),
        processor_id: CpuIdentity::format_processor_id(processor_id),
        cpu64bit: info.flags.iter().any(|f| f == "lm"),
        logical_processor_count: logical,
        physical_processor_count: physical,
    }
}

/// Packs display family/model/stepping back into the CPUID leaf 1 EAX layout.
///
/// Families above 15 spill into the extended family field, models above 15
/// into the extended model field.
pub fn x86_signature(stepping: u32, model: u32, family: u32) -> u32 {
    let (base_family, ext_family) = if family > 0xf {
        (0xf, (family - 0xf) & 0xff)
    } else {
        (family, 0)
    };
    (stepping & 0xf)
        | (model & 0xf) << 4
        | base_family << 8
        | ((model >> 4) & 0xf) << 16
        | ext_family << 20
}

/// Rebuilds the CPUID leaf 1 EDX feature word from cpuinfo flag names.
pub fn edx_feature_bits(flags: &[String]) -> u32 {
    EDX_FEATURE_FLAGS
        .iter()
        .filter(|&&(name, _)| flags.iter().any(|f| f == name))
        .fold(0u32, |bits, &(_, bit)| bits | 1u32 << bit)
}

impl<F: FileSystem> CpuCollector for LinuxCpuCollector<F> {
    fn identity(&self) -> &CpuIdentity {
        &self.identity
    }

    fn boot_time(&self) -> u64 {
        self.boot_time
    }

    fn system_cpu_load_ticks(&self) -> CpuTicks {
        read_stat(&self.fs, &self.proc_path)
            .and_then(|s| s.aggregate().map(|c| c.ticks))
            .unwrap_or_default()
    }

    fn processor_cpu_load_ticks(&self) -> Vec<CpuTicks> {
        let rows = self.identity.logical_processor_count;
        let mut ticks = vec![CpuTicks::default(); rows];
        let Some(stat) = read_stat(&self.fs, &self.proc_path) else {
            return ticks;
        };
        for cpu in &stat.cpus {
            let Some(id) = cpu.cpu_id else { continue };
            if let Some(row) = ticks.get_mut(id as usize) {
                *row = cpu.ticks;
            }
        }
        ticks
    }

    fn system_load_average(&self, nelem: usize) -> Result<Vec<f64>, ProbeError> {
        check_load_average_count(nelem)?;
        let tokens = self.fs.first_line_tokens(&self.proc_path.join("loadavg"));
        Ok(parse_loadavg(&tokens)
            .iter()
            .take(nelem)
            .map(|slot| slot.unwrap_or(-1.0))
            .collect())
    }
}
