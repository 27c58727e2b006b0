use serde::{Deserialize, Serialize};

/// Physical and virtual memory, in bytes.
///
/// `available <= total` and `swap_used <= swap_total` hold on a best-effort
/// basis only: swap usage on some platforms comes from a separately sampled
/// percentage counter and may overshoot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub total: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    /// Epoch milliseconds of the last successful native sample, 0 if never sampled.
    pub updated_at_ms: i64,
}
