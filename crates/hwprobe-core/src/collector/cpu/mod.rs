//! CPU collectors.
//!
//! Each platform reads ticks through a different channel (Mach host calls
//! on macOS, `/proc/stat` on Linux) but they all share the boot time
//! fallback chain, load average validation and the per-core reshape below.

pub mod linux;
pub mod mac;
pub mod mach;

pub use linux::LinuxCpuCollector;
pub use mac::MacCpuCollector;
pub use mach::{MachHost, ProcessorLoad};

use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::model::{CpuTicks, TickType};
use crate::source::parse::unsigned_int;

/// Slot of user ticks in a Mach per-core record.
pub const CPU_STATE_USER: usize = 0;
/// Slot of system ticks in a Mach per-core record.
pub const CPU_STATE_SYSTEM: usize = 1;
/// Slot of idle ticks in a Mach per-core record.
pub const CPU_STATE_IDLE: usize = 2;
/// Slot of nice ticks in a Mach per-core record.
pub const CPU_STATE_NICE: usize = 3;
/// Slots per core in a Mach per-core record.
pub const CPU_STATE_MAX: usize = 4;

/// Resolves the boot time, trying each source only if the previous one
/// produced nothing (or zero).
///
/// 1. `native` — a binary structure from the OS
/// 2. `textual` — parsed out of a command's or pseudo-file's text
/// 3. `now` — current time, so uptime reads as zero
pub fn resolve_boot_time(
    native: impl FnOnce() -> Option<u64>,
    textual: impl FnOnce() -> Option<u64>,
    now: u64,
) -> u64 {
    if let Some(secs) = native().filter(|s| *s > 0) {
        return secs;
    }
    debug!("native boot time unavailable, parsing text");
    if let Some(secs) = textual().filter(|s| *s > 0) {
        return secs;
    }
    warn!("boot time unavailable, using current time");
    now
}

/// Rejects load average requests outside one to three elements.
pub fn check_load_average_count(nelem: usize) -> Result<(), ProbeError> {
    if !(1..=3).contains(&nelem) {
        return Err(ProbeError::InvalidArgument(format!(
            "load average must include from one to three elements, got {}",
            nelem
        )));
    }
    Ok(())
}

/// Sets every slot the native call did not fill to -1.0.
///
/// `filled` is the native return value; negative means nothing was filled.
/// Zero is a valid load, so unfilled slots must not be left at zero.
pub fn mark_unfilled_load_average(average: &mut [f64], filled: i32) {
    let start = usize::try_from(filled).unwrap_or(0);
    for slot in average.iter_mut().skip(start) {
        *slot = -1.0;
    }
}

/// Reshapes a flat per-core tick array into one [`CpuTicks`] per core.
///
/// `raw` holds `CPU_STATE_MAX` slots per core. Each value is a 32-bit
/// counter that may have wrapped past `i32::MAX`, so it is read as unsigned
/// before widening. The result always has `rows` entries; cores beyond
/// `rows` or beyond the end of `raw` are ignored, missing cores stay zero.
pub fn reshape_processor_ticks(raw: &[i32], cpu_count: usize, rows: usize) -> Vec<CpuTicks> {
    let mut ticks = vec![CpuTicks::default(); rows];
    for (cpu, row) in ticks.iter_mut().enumerate().take(cpu_count) {
        let offset = cpu * CPU_STATE_MAX;
        let Some(states) = raw.get(offset..offset + CPU_STATE_MAX) else {
            break;
        };
        row[TickType::User] = unsigned_int(states[CPU_STATE_USER]);
        row[TickType::Nice] = unsigned_int(states[CPU_STATE_NICE]);
        row[TickType::System] = unsigned_int(states[CPU_STATE_SYSTEM]);
        row[TickType::Idle] = unsigned_int(states[CPU_STATE_IDLE]);
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_boot_time_prefers_native() {
        let text_called = Cell::new(false);
        let boot = resolve_boot_time(
            || Some(1_600_000_000),
            || {
                text_called.set(true);
                Some(1)
            },
            1_700_000_000,
        );
        assert_eq!(boot, 1_600_000_000);
        assert!(!text_called.get());
    }

    #[test]
    fn test_boot_time_falls_back_to_text_on_zero() {
        let boot = resolve_boot_time(|| Some(0), || Some(1_500_000_000), 1_700_000_000);
        assert_eq!(boot, 1_500_000_000);
    }

    #[test]
    fn test_boot_time_falls_back_to_now() {
        let boot = resolve_boot_time(|| None, || None, 1_700_000_000);
        assert_eq!(boot, 1_700_000_000);
    }

    #[test]
    fn test_load_average_count_bounds() {
        assert!(check_load_average_count(0).is_err());
        assert!(check_load_average_count(4).is_err());
        for n in 1..=3 {
            assert!(check_load_average_count(n).is_ok());
        }
    }

    #[test]
    fn test_mark_unfilled_load_average() {
        let mut average = vec![0.42, 0.0];
        mark_unfilled_load_average(&mut average, 1);
        assert_eq!(average, vec![0.42, -1.0]);

        let mut failed = vec![0.0, 0.0, 0.0];
        mark_unfilled_load_average(&mut failed, -1);
        assert_eq!(failed, vec![-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_reshape_processor_ticks_unsigned() {
        // user, system, idle, nice per core
        let raw = [-1, 20, 30, 40, 5, 6, 7, 8];
        let ticks = reshape_processor_ticks(&raw, 2, 2);

        assert_eq!(ticks[0][TickType::User], 4_294_967_295);
        assert_eq!(ticks[0][TickType::System], 20);
        assert_eq!(ticks[0][TickType::Idle], 30);
        assert_eq!(ticks[0][TickType::Nice], 40);
        assert_eq!(ticks[1][TickType::User], 5);
        assert_eq!(ticks[1][TickType::Nice], 8);
        assert_eq!(ticks[1][TickType::IoWait], 0);
    }

    #[test]
    fn test_reshape_processor_ticks_bounds() {
        let raw = [1, 2, 3, 4, 5, 6];
        // second core is truncated, third row has no data
        let ticks = reshape_processor_ticks(&raw, 4, 3);
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[0][TickType::User], 1);
        assert_eq!(ticks[1], CpuTicks::default());
        assert_eq!(ticks[2], CpuTicks::default());

        let fewer_rows = reshape_processor_ticks(&raw[..4], 1, 0);
        assert!(fewer_rows.is_empty());
    }
}
