//! Raw data sources and the extraction helpers built on them.
//!
//! Two kinds of source feed every collector:
//!
//! - [`FileSystem`] — pseudo-files such as `/proc/stat` (real or in-memory)
//! - [`CommandRunner`] — external diagnostic commands such as `xrandr --verbose`
//!
//! The helpers in [`file`] and [`parse`] turn raw output into lines and
//! scalars. They report failure as `Option`/`Result` at the lowest level and
//! offer default-collapsing wrappers (`0`, `""`, empty) on top, so a missing
//! source never propagates past a collector.

pub mod command;
pub mod file;
pub mod mock;
pub mod parse;
pub mod traits;

pub use command::{CommandRunner, SystemCommandRunner};
pub use file::FileSystemExt;
pub use mock::{MockCommandRunner, MockFs};
pub use traits::{FileSystem, RealFs};
