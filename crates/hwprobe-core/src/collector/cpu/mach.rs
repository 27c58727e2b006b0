//! Native CPU interfaces on macOS: `sysctlbyname`, Mach host statistics and
//! `getloadavg`.
//!
//! [`MachHost`] is the seam between the collector and the kernel. The real
//! implementation, [`SystemMachHost`], only exists on macOS; tests drive the
//! collector through a scripted host on any platform.

use super::CPU_STATE_MAX;

/// Flat per-core tick array as returned by `host_processor_info`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessorLoad {
    /// Number of cores the kernel reported.
    pub cpu_count: usize,
    /// `CPU_STATE_MAX` signed 32-bit slots per core.
    pub ticks: Vec<i32>,
}

/// Kernel calls the macOS CPU collector relies on.
pub trait MachHost: Send + Sync {
    fn sysctl_string(&self, name: &str) -> Option<String>;

    fn sysctl_int(&self, name: &str) -> Option<i32>;

    fn sysctl_long(&self, name: &str) -> Option<i64>;

    /// Seconds field of the `kern.boottime` timeval.
    fn boot_time_secs(&self) -> Option<i64>;

    /// `host_statistics(HOST_CPU_LOAD_INFO)`; the error is the `kern_return_t`.
    fn host_cpu_load(&self) -> Result<[u32; CPU_STATE_MAX], i32>;

    /// `host_processor_info(PROCESSOR_CPU_LOAD_INFO)`; the error is the `kern_return_t`.
    fn host_processor_load(&self) -> Result<ProcessorLoad, i32>;

    /// `getloadavg` into `average`; returns the number of samples written or -1.
    fn load_average(&self, average: &mut [f64]) -> i32;
}

#[cfg(target_os = "macos")]
pub use system::SystemMachHost;

#[cfg(target_os = "macos")]
mod system {
    use std::ffi::CString;
    use std::mem;
    use std::ptr;

    use super::{CPU_STATE_MAX, MachHost, ProcessorLoad};

    const HOST_CPU_LOAD_INFO: i32 = 3;
    const HOST_CPU_LOAD_INFO_COUNT: u32 = CPU_STATE_MAX as u32;
    const PROCESSOR_CPU_LOAD_INFO: i32 = 2;
    const KERN_SUCCESS: i32 = 0;

    unsafe extern "C" {
        static mach_task_self_: u32;
        fn mach_host_self() -> u32;
        fn host_statistics(host: u32, flavor: i32, info: *mut i32, count: *mut u32) -> i32;
        fn host_processor_info(
            host: u32,
            flavor: i32,
            out_processor_count: *mut u32,
            out_processor_info: *mut *mut i32,
            out_processor_info_count: *mut u32,
        ) -> i32;
        fn vm_deallocate(target_task: u32, address: usize, size: usize) -> i32;
    }

    /// Talks to the running kernel.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemMachHost;

    impl SystemMachHost {
        pub fn new() -> Self {
            Self
        }

        /// Reads a fixed-size sysctl value into `T`.
        fn sysctl_value<T: Copy + Default>(name: &str) -> Option<T> {
            let name_c = CString::new(name).ok()?;
            let mut value = T::default();
            let mut size = mem::size_of::<T>();
            // SAFETY: `value` is a valid buffer of `size` bytes for the call.
            let rc = unsafe {
                libc::sysctlbyname(
                    name_c.as_ptr(),
                    (&mut value as *mut T).cast(),
                    &mut size,
                    ptr::null_mut(),
                    0,
                )
            };
            (rc == 0 && size == mem::size_of::<T>()).then_some(value)
        }
    }

    impl MachHost for SystemMachHost {
        fn sysctl_string(&self, name: &str) -> Option<String> {
            let name_c = CString::new(name).ok()?;
            let mut size: libc::size_t = 0;
            // SAFETY: a null buffer asks the kernel for the required size.
            let rc = unsafe {
                libc::sysctlbyname(
                    name_c.as_ptr(),
                    ptr::null_mut(),
                    &mut size,
                    ptr::null_mut(),
                    0,
                )
            };
            if rc != 0 || size == 0 {
                return None;
            }
            let mut buf = vec![0u8; size];
            // SAFETY: `buf` holds `size` bytes as reported by the first call.
            let rc = unsafe {
                libc::sysctlbyname(
                    name_c.as_ptr(),
                    buf.as_mut_ptr().cast(),
                    &mut size,
                    ptr::null_mut(),
                    0,
                )
            };
            if rc != 0 {
                return None;
            }
            buf.truncate(size);
            if buf.last() == Some(&0) {
                buf.pop();
            }
            Some(String::from_utf8_lossy(&buf).into_owned())
        }

        fn sysctl_int(&self, name: &str) -> Option<i32> {
            Self::sysctl_value::<i32>(name)
        }

        fn sysctl_long(&self, name: &str) -> Option<i64> {
            Self::sysctl_value::<i64>(name)
        }

        fn boot_time_secs(&self) -> Option<i64> {
            let name_c = CString::new("kern.boottime").ok()?;
            let mut tv = libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            };
            let mut size = mem::size_of::<libc::timeval>();
            // SAFETY: `tv` is a valid timeval buffer of `size` bytes.
            let rc = unsafe {
                libc::sysctlbyname(
                    name_c.as_ptr(),
                    (&mut tv as *mut libc::timeval).cast(),
                    &mut size,
                    ptr::null_mut(),
                    0,
                )
            };
            (rc == 0).then_some(tv.tv_sec as i64)
        }

        fn host_cpu_load(&self) -> Result<[u32; CPU_STATE_MAX], i32> {
            let mut ticks = [0u32; CPU_STATE_MAX];
            let mut count = HOST_CPU_LOAD_INFO_COUNT;
            // SAFETY: `ticks` holds HOST_CPU_LOAD_INFO_COUNT integers.
            let rc = unsafe {
                host_statistics(
                    mach_host_self(),
                    HOST_CPU_LOAD_INFO,
                    ticks.as_mut_ptr().cast(),
                    &mut count,
                )
            };
            if rc != KERN_SUCCESS {
                return Err(rc);
            }
            Ok(ticks)
        }

        fn host_processor_load(&self) -> Result<ProcessorLoad, i32> {
            let mut cpu_count: u32 = 0;
            let mut info: *mut i32 = ptr::null_mut();
            let mut info_count: u32 = 0;
            // SAFETY: all out-pointers are valid; the kernel allocates `info`.
            let rc = unsafe {
                host_processor_info(
                    mach_host_self(),
                    PROCESSOR_CPU_LOAD_INFO,
                    &mut cpu_count,
                    &mut info,
                    &mut info_count,
                )
            };
            if rc != KERN_SUCCESS || info.is_null() {
                return Err(rc);
            }
            // SAFETY: on success `info` points to `info_count` integers owned
            // by us until deallocated.
            let ticks = unsafe { std::slice::from_raw_parts(info, info_count as usize) }.to_vec();
            // SAFETY: returns the kernel-allocated buffer to our task's map.
            unsafe {
                vm_deallocate(
                    mach_task_self_,
                    info as usize,
                    info_count as usize * mem::size_of::<i32>(),
                );
            }
            Ok(ProcessorLoad {
                cpu_count: cpu_count as usize,
                ticks,
            })
        }

        fn load_average(&self, average: &mut [f64]) -> i32 {
            // SAFETY: `average` has room for `len` doubles.
            unsafe { libc::getloadavg(average.as_mut_ptr(), average.len() as libc::c_int) }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Mach host with canned answers.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct ScriptedMachHost {
        pub strings: HashMap<String, String>,
        pub ints: HashMap<String, i32>,
        pub longs: HashMap<String, i64>,
        pub boot_time: Option<i64>,
        pub cpu_load: Option<[u32; CPU_STATE_MAX]>,
        pub processor_load: Option<ProcessorLoad>,
        pub load_average: Vec<f64>,
    }

    impl MachHost for ScriptedMachHost {
        fn sysctl_string(&self, name: &str) -> Option<String> {
            self.strings.get(name).cloned()
        }

        fn sysctl_int(&self, name: &str) -> Option<i32> {
            self.ints.get(name).copied()
        }

        fn sysctl_long(&self, name: &str) -> Option<i64> {
            self.longs.get(name).copied()
        }

        fn boot_time_secs(&self) -> Option<i64> {
            self.boot_time
        }

        fn host_cpu_load(&self) -> Result<[u32; CPU_STATE_MAX], i32> {
            self.cpu_load.ok_or(5)
        }

        fn host_processor_load(&self) -> Result<ProcessorLoad, i32> {
            self.processor_load.clone().ok_or(5)
        }

        fn load_average(&self, average: &mut [f64]) -> i32 {
            let n = self.load_average.len().min(average.len());
            average[..n].copy_from_slice(&self.load_average[..n]);
            if self.load_average.is_empty() {
                -1
            } else {
                n as i32
            }
        }
    }
}
