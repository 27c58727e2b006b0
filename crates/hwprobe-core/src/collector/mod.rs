//! Per-platform hardware collectors.
//!
//! Each metric domain has a capability trait in [`traits`] and one
//! implementation per platform. Collectors never touch the OS directly: they
//! read through a [`FileSystem`](crate::source::FileSystem), a
//! [`CommandRunner`](crate::source::CommandRunner) or a native-call seam
//! ([`MachHost`], [`PerformanceSource`], [`HostResolver`]), so every backend
//! can be tested on any host.
//!
//! ```text
//!                     SystemInfo
//!                          │
//!   ┌──────────┬───────────┼────────────┬───────────┐
//!   │   CPU    │  Memory   │  Display   │  Network  │
//!   │ mac      │ windows   │ xrandr     │ mac       │
//!   │ linux    │ linux     │            │ linux     │
//!   └────┬─────┴─────┬─────┴──────┬─────┴─────┬─────┘
//!        │           │            │           │
//!   MachHost   FileSystem   CommandRunner  HostResolver
//!              PerformanceSource
//! ```
//!
//! # Usage
//!
//! ```
//! use hwprobe_core::collector::{CpuCollector, LinuxCpuCollector};
//! use hwprobe_core::source::MockFs;
//!
//! let fs = MockFs::new()
//!     .with_file("/proc/stat", "cpu  100 0 50 1000 0 0 0 0\nbtime 1700000000\n")
//!     .with_file("/proc/loadavg", "0.50 0.25 0.10 1/100 42\n");
//! let cpu = LinuxCpuCollector::new(fs, "/proc");
//!
//! assert_eq!(cpu.boot_time(), 1_700_000_000);
//! assert_eq!(cpu.system_load_average(1).unwrap(), vec![0.50]);
//! ```

pub mod cpu;
pub mod display;
pub mod memory;
pub mod network;
pub mod procfs;
pub mod traits;
pub mod unsupported;

pub use cpu::{LinuxCpuCollector, MacCpuCollector, MachHost};
pub use display::XrandrDisplayCollector;
pub use memory::{LinuxMemoryCollector, PerformanceSource, ThrottledMemory, WindowsMemoryCollector};
pub use network::{HostResolver, LinuxNetworkCollector, MacNetworkCollector};
pub use traits::{CpuCollector, DisplayCollector, MemoryCollector, NetworkCollector};
pub use unsupported::Unsupported;
