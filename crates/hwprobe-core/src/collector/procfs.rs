//! Parsers for Linux `/proc` files.
//!
//! These are pure functions over already extracted lines, tokens or
//! key/value maps (see [`FileSystemExt`](crate::source::FileSystemExt)), so
//! they can be tested with string inputs. Collectors extract, call the
//! parser and map a `ParseError` to defaults.

use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::ParseError;
use crate::model::{CpuTicks, TickType};
use crate::source::parse::hex_to_bytes;

/// `RTF_GATEWAY` route flag: the destination is reached through a gateway.
const RTF_GATEWAY: u32 = 0x0002;

/// Single CPU line from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuStat {
    /// `None` for the aggregate "cpu" line.
    pub cpu_id: Option<u32>,
    pub ticks: CpuTicks,
}

/// Global stats from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    pub cpus: Vec<CpuStat>,
    /// Boot time in seconds since the epoch, 0 if absent.
    pub btime: u64,
}

impl GlobalStat {
    /// The aggregate "cpu" line, if present.
    pub fn aggregate(&self) -> Option<&CpuStat> {
        self.cpus.iter().find(|c| c.cpu_id.is_none())
    }
}

/// Parses `/proc/stat` content.
///
/// Columns 1..=8 of each `cpu` line map to user, nice, system, idle, iowait,
/// irq, softirq and steal. Older kernels print fewer columns; the missing
/// categories stay zero.
pub fn parse_global_stat(lines: &[String]) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();

    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        if parts[0].starts_with("cpu") {
            let cpu_id = if parts[0] == "cpu" {
                None
            } else {
                match parts[0].strip_prefix("cpu").and_then(|s| s.parse().ok()) {
                    Some(id) => Some(id),
                    None => continue,
                }
            };

            let mut ticks = CpuTicks::default();
            for tick in TickType::ALL {
                ticks[tick] = parts
                    .get(tick.index() + 1)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
            }
            stat.cpus.push(CpuStat { cpu_id, ticks });
        } else if parts[0] == "btime" {
            stat.btime = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
        }
    }

    if stat.cpus.is_empty() {
        return Err(ParseError::new("no cpu lines in stat"));
    }
    Ok(stat)
}

/// Parsed data from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    /// Absent on kernels older than 3.14.
    pub mem_available: Option<u64>,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

impl MemInfo {
    /// Available memory in kB, estimated from free + buffers + cached when
    /// the kernel does not report `MemAvailable`.
    pub fn available(&self) -> u64 {
        self.mem_available
            .unwrap_or(self.mem_free + self.buffers + self.cached)
    }
}

/// Parses `/proc/meminfo` split on `:`, values like `"16384000 kB"`.
pub fn parse_meminfo(fields: &HashMap<String, String>) -> Result<MemInfo, ParseError> {
    let kb = |key: &str| -> Option<u64> {
        fields
            .get(key)?
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
    };

    if !fields.contains_key("MemTotal") {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }
    Ok(MemInfo {
        mem_total: kb("MemTotal").unwrap_or(0),
        mem_free: kb("MemFree").unwrap_or(0),
        mem_available: fields.get("MemAvailable").map(|_| kb("MemAvailable").unwrap_or(0)),
        buffers: kb("Buffers").unwrap_or(0),
        cached: kb("Cached").unwrap_or(0),
        swap_total: kb("SwapTotal").unwrap_or(0),
        swap_free: kb("SwapFree").unwrap_or(0),
    })
}

/// Parses the three load averages from the `/proc/loadavg` tokens.
///
/// Each slot is parsed independently; an unparsable field is `None`.
pub fn parse_loadavg(tokens: &[String]) -> [Option<f64>; 3] {
    std::array::from_fn(|i| tokens.get(i).and_then(|s| s.parse().ok()))
}

/// Parses the uptime in seconds (first token) from `/proc/uptime`.
pub fn parse_uptime(tokens: &[String]) -> Result<f64, ParseError> {
    tokens
        .first()
        .ok_or_else(|| ParseError::new("empty uptime"))?
        .parse()
        .map_err(|_| ParseError::new("invalid uptime"))
}

/// Identity fields from `/proc/cpuinfo`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuInfo {
    pub vendor: String,
    pub name: String,
    pub stepping: Option<u32>,
    pub model: Option<u32>,
    pub family: Option<u32>,
    pub flags: Vec<String>,
    /// Number of `processor` entries.
    pub logical_count: usize,
    /// Distinct (physical id, core id) pairs, 0 when the kernel reports neither.
    pub physical_count: usize,
}

/// Parses `/proc/cpuinfo` lines.
///
/// Identity fields are taken from the first processor entry.
pub fn parse_cpuinfo(lines: &[String]) -> CpuInfo {
    let mut info = CpuInfo::default();
    let mut cores: HashSet<(String, String)> = HashSet::new();
    let mut physical_id = String::new();

    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        let first = info.logical_count <= 1;
        match key.trim() {
            "processor" => {
                info.logical_count += 1;
                physical_id.clear();
            }
            "vendor_id" if first && info.vendor.is_empty() => info.vendor = value.to_string(),
            "model name" if first && info.name.is_empty() => info.name = value.to_string(),
            "stepping" if first && info.stepping.is_none() => info.stepping = value.parse().ok(),
            "model" if first && info.model.is_none() => info.model = value.parse().ok(),
            "cpu family" if first && info.family.is_none() => info.family = value.parse().ok(),
            "flags" if first && info.flags.is_empty() => {
                info.flags = value.split_whitespace().map(str::to_string).collect();
            }
            "physical id" => physical_id = value.to_string(),
            "core id" => {
                cores.insert((physical_id.clone(), value.to_string()));
            }
            _ => {}
        }
    }

    info.physical_count = cores.len();
    info
}

/// Finds the IPv4 default gateway in `/proc/net/route`.
///
/// Addresses are printed as the host-endian `u32` of the network-order
/// bytes, so `0101A8C0` is 192.168.1.1 on a little-endian host. With several
/// default routes the lowest metric wins.
pub fn parse_ipv4_default_gateway(lines: &[String]) -> Option<Ipv4Addr> {
    let mut best: Option<(u32, Ipv4Addr)> = None;

    for line in lines.iter().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 || fields[1] != "00000000" {
            continue;
        }
        let flags = u32::from_str_radix(fields[3], 16).unwrap_or(0);
        if flags & RTF_GATEWAY == 0 {
            continue;
        }
        let Ok(raw) = u32::from_str_radix(fields[2], 16) else {
            continue;
        };
        if raw == 0 {
            continue;
        }
        let metric = fields[6].parse().unwrap_or(u32::MAX);
        let gateway = Ipv4Addr::from(raw.to_ne_bytes());
        if best.is_none_or(|(m, _)| metric < m) {
            best = Some((metric, gateway));
        }
    }

    best.map(|(_, gw)| gw)
}

/// Finds the IPv6 default gateway in `/proc/net/ipv6_route`.
///
/// Each address is 32 hex digits in network byte order. A default route has
/// an all-zero destination with prefix length 0, the gateway flag and a
/// non-zero next hop. With several candidates the lowest metric wins.
pub fn parse_ipv6_default_gateway(lines: &[String]) -> Option<Ipv6Addr> {
    let mut best: Option<(u32, Ipv6Addr)> = None;

    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let dest_is_default =
            fields[0].bytes().all(|b| b == b'0') && u8::from_str_radix(fields[1], 16) == Ok(0);
        if !dest_is_default {
            continue;
        }
        let flags = u32::from_str_radix(fields[8], 16).unwrap_or(0);
        if flags & RTF_GATEWAY == 0 {
            continue;
        }
        let Ok(octets) = <[u8; 16]>::try_from(hex_to_bytes(fields[4])) else {
            continue;
        };
        let next_hop = Ipv6Addr::from(octets);
        if next_hop.is_unspecified() {
            continue;
        }
        let metric = u32::from_str_radix(fields[5], 16).unwrap_or(u32::MAX);
        if best.is_none_or(|(m, _)| metric < m) {
            best = Some((metric, next_hop));
        }
    }

    best.map(|(_, gw)| gw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(content: &str) -> Vec<String> {
        content.lines().map(str::to_string).collect()
    }

    fn tokens(content: &str) -> Vec<String> {
        content.split_whitespace().map(str::to_string).collect()
    }

    fn fields(content: &str) -> HashMap<String, String> {
        content
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.to_string(), v.trim().to_string()))
            .collect()
    }

    #[test]
    fn test_parse_global_stat() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 50 0 0
cpu0 2500 125 750 20000 250 50 25 10 0 0
cpu1 2500 125 750 20000 250 50 25 40 0 0
intr 1000000 50 0 0
ctxt 500000
btime 1700000000
processes 10000
";
        let stat = parse_global_stat(&lines(content)).unwrap();

        assert_eq!(stat.cpus.len(), 3);
        let total = stat.aggregate().unwrap();
        assert_eq!(
            total.ticks.as_array(),
            &[10000, 500, 3000, 80000, 1000, 200, 100, 50]
        );
        assert_eq!(stat.cpus[1].cpu_id, Some(0));
        assert_eq!(stat.cpus[2].cpu_id, Some(1));
        assert_eq!(stat.cpus[2].ticks[TickType::Steal], 40);
        assert_eq!(stat.btime, 1_700_000_000);
    }

    #[test]
    fn test_parse_global_stat_short_lines() {
        // 2.4-era kernels only report four columns
        let stat = parse_global_stat(&lines("cpu 1 2 3 4\n")).unwrap();
        let total = stat.aggregate().unwrap();
        assert_eq!(total.ticks[TickType::Idle], 4);
        assert_eq!(total.ticks[TickType::IoWait], 0);
        assert_eq!(stat.btime, 0);
    }

    #[test]
    fn test_parse_global_stat_rejects_garbage() {
        assert!(parse_global_stat(&lines("hello world\n")).is_err());
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        3072000 kB
";
        let info = parse_meminfo(&fields(content)).unwrap();

        assert_eq!(info.mem_total, 16_384_000);
        assert_eq!(info.available(), 12_000_000);
        assert_eq!(info.cached, 2_048_000);
        assert_eq!(info.swap_total, 4_096_000);
        assert_eq!(info.swap_free, 3_072_000);
    }

    #[test]
    fn test_parse_meminfo_without_mem_available() {
        let content = "\
MemTotal:       1000 kB
MemFree:         100 kB
Buffers:          20 kB
Cached:           30 kB
";
        let info = parse_meminfo(&fields(content)).unwrap();
        assert_eq!(info.mem_available, None);
        assert_eq!(info.available(), 150);
    }

    #[test]
    fn test_parse_meminfo_requires_total() {
        assert!(parse_meminfo(&fields("MemFree: 10 kB\n")).is_err());
    }

    #[test]
    fn test_parse_loadavg() {
        let load = parse_loadavg(&tokens("0.15 0.10 0.05 1/150 1234\n"));
        assert_eq!(load, [Some(0.15), Some(0.10), Some(0.05)]);

        let partial = parse_loadavg(&tokens("0.50 junk"));
        assert_eq!(partial, [Some(0.50), None, None]);
    }

    #[test]
    fn test_parse_uptime() {
        let uptime = parse_uptime(&tokens("12345.67 98765.43\n")).unwrap();
        assert!((uptime - 12345.67).abs() < 1e-9);
        assert!(parse_uptime(&[]).is_err());
    }

    #[test]
    fn test_parse_cpuinfo() {
        let content = "\
processor\t: 0
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 60
model name\t: Intel(R) Core(TM) i7-4770 CPU @ 3.40GHz
stepping\t: 3
physical id\t: 0
core id\t\t: 0
flags\t\t: fpu vme de pse tsc lm

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-4770 CPU @ 3.40GHz
physical id\t: 0
core id\t\t: 1

processor\t: 2
physical id\t: 0
core id\t\t: 0
";
        let info = parse_cpuinfo(&lines(content));

        assert_eq!(info.vendor, "GenuineIntel");
        assert_eq!(info.name, "Intel(R) Core(TM) i7-4770 CPU @ 3.40GHz");
        assert_eq!(info.family, Some(6));
        assert_eq!(info.model, Some(60));
        assert_eq!(info.stepping, Some(3));
        assert!(info.flags.iter().any(|f| f == "lm"));
        assert_eq!(info.logical_count, 3);
        assert_eq!(info.physical_count, 2);
    }

    #[test]
    fn test_parse_cpuinfo_core_without_physical_id() {
        // the second entry has no physical id and must not pair with the first
        let content = "\
processor\t: 0
physical id\t: 1
core id\t\t: 0

processor\t: 1
core id\t\t: 0
";
        let info = parse_cpuinfo(&lines(content));
        assert_eq!(info.logical_count, 2);
        assert_eq!(info.physical_count, 2);
    }

    #[test]
    fn test_parse_ipv4_default_gateway() {
        let content = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
wlan0\t00000000\t0100000A\t0003\t0\t0\t600\t00000000\t0\t0\t0
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
";
        let gateway = parse_ipv4_default_gateway(&lines(content)).unwrap();
        if cfg!(target_endian = "little") {
            assert_eq!(gateway, Ipv4Addr::new(192, 168, 1, 1));
        }
    }

    #[test]
    fn test_parse_ipv4_default_gateway_none() {
        let content = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
";
        assert_eq!(parse_ipv4_default_gateway(&lines(content)), None);
    }

    #[test]
    fn test_parse_ipv6_default_gateway() {
        let content = "\
fe800000000000000000000000000000 40 00000000000000000000000000000000 00 00000000000000000000000000000000 00000100 00000001 00000000 00000001     eth0
00000000000000000000000000000000 00 00000000000000000000000000000000 00 fe800000000000000000000000000001 00000400 00000001 00000000 00000003     eth0
00000000000000000000000000000000 00 00000000000000000000000000000000 00 00000000000000000000000000000000 ffffffff 00000001 00000000 00200200       lo
";
        let gateway = parse_ipv6_default_gateway(&lines(content)).unwrap();
        assert_eq!(gateway.to_string(), "fe80::1");
    }

    #[test]
    fn test_parse_ipv6_default_gateway_requires_gateway_flag() {
        let content = "\
00000000000000000000000000000000 00 00000000000000000000000000000000 00 fe800000000000000000000000000001 00000400 00000001 00000000 00000001     eth0
";
        assert_eq!(parse_ipv6_default_gateway(&lines(content)), None);
    }
}
