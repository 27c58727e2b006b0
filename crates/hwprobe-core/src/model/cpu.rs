//! CPU tick vectors and processor identity.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// CPU state category a tick is accounted to.
///
/// The discriminant is the slot index inside [`CpuTicks`] and never changes,
/// so a tick vector means the same thing whichever platform produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickType {
    User = 0,
    Nice = 1,
    System = 2,
    Idle = 3,
    IoWait = 4,
    Irq = 5,
    SoftIrq = 6,
    Steal = 7,
}

impl TickType {
    /// Number of categories (and slots in a tick vector).
    pub const COUNT: usize = 8;

    /// All categories in index order.
    pub const ALL: [TickType; Self::COUNT] = [
        TickType::User,
        TickType::Nice,
        TickType::System,
        TickType::Idle,
        TickType::IoWait,
        TickType::Irq,
        TickType::SoftIrq,
        TickType::Steal,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Cumulative ticks since boot, one counter per [`TickType`].
///
/// Used both for the whole machine and for one logical core. Categories a
/// platform does not report stay zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTicks([u64; TickType::COUNT]);

impl CpuTicks {
    pub fn new(ticks: [u64; TickType::COUNT]) -> Self {
        Self(ticks)
    }

    pub fn as_array(&self) -> &[u64; TickType::COUNT] {
        &self.0
    }

    /// Sum over all categories.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, t| acc.wrapping_add(*t))
    }

    /// Per-category difference `self - prev`.
    ///
    /// Wrapping subtraction, so a counter that overflowed between the two
    /// samples still yields the elapsed ticks.
    pub fn delta(&self, prev: &CpuTicks) -> CpuTicks {
        let mut out = [0u64; TickType::COUNT];
        for (slot, (cur, old)) in out.iter_mut().zip(self.0.iter().zip(prev.0.iter())) {
            *slot = cur.wrapping_sub(*old);
        }
        CpuTicks(out)
    }
}

impl Index<TickType> for CpuTicks {
    type Output = u64;

    fn index(&self, tick: TickType) -> &u64 {
        &self.0[tick.index()]
    }
}

impl IndexMut<TickType> for CpuTicks {
    fn index_mut(&mut self, tick: TickType) -> &mut u64 {
        &mut self.0[tick.index()]
    }
}

/// Fraction of non-idle time between two samples, in `[0.0, 1.0]`.
///
/// Returns 0.0 when no ticks elapsed.
pub fn cpu_load_between(prev: &CpuTicks, cur: &CpuTicks) -> f64 {
    let delta = cur.delta(prev);
    let total = delta.total();
    let idle = delta[TickType::Idle];
    if total == 0 || idle > total {
        return 0.0;
    }
    (total - idle) as f64 / total as f64
}

/// Processor identity. Computed once when a CPU collector is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuIdentity {
    pub vendor: String,
    /// Brand string, e.g. "Intel(R) Core(TM) i7-4770 CPU @ 3.40GHz".
    pub name: String,
    /// Decimal string, empty when unavailable.
    pub stepping: String,
    /// Decimal string, empty when unavailable.
    pub model: String,
    /// Decimal string, empty when unavailable.
    pub family: String,
    /// 16 upper-case hex digits: feature bits in the high half, signature in the low half.
    pub processor_id: String,
    pub cpu64bit: bool,
    pub logical_processor_count: usize,
    pub physical_processor_count: usize,
}

impl CpuIdentity {
    /// Formats a synthesized 64-bit processor id the way `processor_id` stores it.
    pub fn format_processor_id(id: u64) -> String {
        format!("{:016X}", id)
    }
}
