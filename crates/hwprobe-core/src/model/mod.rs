//! Platform-neutral data model.
//!
//! These are plain data types with no behavior tied to a platform. Every
//! collector, whatever channel it reads from, produces these.

mod cpu;
pub(crate) mod display;
mod memory;
mod network;

pub use cpu::{CpuIdentity, CpuTicks, TickType, cpu_load_between};
pub use display::{Display, EDID_BLOCK_LEN, EdidInfo};
pub use memory::MemorySnapshot;
pub use network::NetworkParams;
