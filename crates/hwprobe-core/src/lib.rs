//! hwprobe-core — platform-neutral hardware and OS observation.
//!
//! Provides:
//! - `model` — tick vectors, CPU identity, memory snapshot, displays, network parameters
//! - `source` — pseudo-file and external command access with default-on-failure helpers
//! - `collector` — per-platform CPU, memory, display and network collectors
//! - `system` — `SystemInfo`, which picks the collectors for the build target
//!
//! Everything here is read-only and synchronous. A missing data source never
//! fails a call: it degrades to zero, empty or the last good value.

pub mod collector;
pub mod config;
pub mod error;
pub mod model;
pub mod source;
pub mod system;
pub mod util;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use system::{HardwareSnapshot, SystemInfo};
