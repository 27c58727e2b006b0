//! Collector configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default minimum interval between two native memory samples.
pub const DEFAULT_MEMORY_REFRESH_MS: u64 = 100;

/// Default bound on an external command's run time.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 5_000;

/// Settings shared by all collectors.
///
/// Missing fields deserialize to their defaults, so a partial document is
/// enough to override a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Base path of the proc filesystem (usually "/proc").
    pub proc_path: String,
    /// Resolver configuration read for DNS servers.
    pub resolv_conf_path: String,
    /// Memory statistics are re-sampled at most once per this many milliseconds.
    pub memory_refresh_interval_ms: u64,
    /// External commands are killed after this many milliseconds.
    pub command_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            proc_path: "/proc".to_string(),
            resolv_conf_path: "/etc/resolv.conf".to_string(),
            memory_refresh_interval_ms: DEFAULT_MEMORY_REFRESH_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

impl ProbeConfig {
    pub fn memory_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.memory_refresh_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
