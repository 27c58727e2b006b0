//! Network parameter collectors.
//!
//! Host naming goes through [`HostResolver`]; DNS servers come from
//! `resolv.conf`; default gateways are read from routing commands (macOS) or
//! procfs routing tables (Linux). Every value degrades to empty.

pub mod linux;
pub mod mac;

pub use linux::LinuxNetworkCollector;
pub use mac::MacNetworkCollector;

use std::path::Path;

use tracing::{debug, warn};

use crate::source::file::FileSystemExt;
use crate::source::traits::FileSystem;

/// Host name resolution.
pub trait HostResolver: Send + Sync {
    /// Local host name as the system reports it.
    fn host_name(&self) -> Option<String>;

    /// Canonical name of `host` as reported by the resolver.
    fn canonical_name(&self, host: &str) -> Option<String>;
}

/// Fully qualified domain name of the local host, or "".
pub fn resolve_domain_name<H: HostResolver + ?Sized>(resolver: &H) -> String {
    let Some(host) = resolver.host_name() else {
        warn!("unable to determine local host name");
        return String::new();
    };
    match resolver.canonical_name(&host) {
        Some(name) => name.trim().to_string(),
        None => {
            debug!(host = %host, "no canonical name for host");
            String::new()
        }
    }
}

/// Name servers listed in a `resolv.conf`, in file order without duplicates.
pub fn read_dns_servers<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Vec<String> {
    parse_resolv_conf(&fs.read_lines(path))
}

/// Extracts `nameserver` entries from `resolv.conf` lines.
///
/// Comments (`#` or `;`) are ignored, as is anything after the address.
pub fn parse_resolv_conf(lines: &[String]) -> Vec<String> {
    let mut servers: Vec<String> = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut fields = line.split_whitespace();
        if fields.next() != Some("nameserver") {
            continue;
        }
        if let Some(server) = fields.next()
            && !servers.iter().any(|s| s == server)
        {
            servers.push(server.to_string());
        }
    }
    servers
}

/// Returns the value of the first `gateway:` line of `route -n get` output.
pub fn search_gateway(lines: &[String]) -> String {
    lines
        .iter()
        .find_map(|line| line.trim().strip_prefix("gateway:"))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Header that opens the IPv6 section of `netstat -nr`.
const IPV6_ROUTE_HEADER: &str = "Internet6:";

/// Destination column of a default route.
const DEFAULT_ROUTE: &str = "default";

/// Scans `netstat -nr` output for the IPv6 default gateway.
///
/// Lines before the `Internet6:` header are ignored. After it, the first
/// `default` route whose flags column contains `G` yields its gateway with
/// any `%scope` suffix removed. A default route without `G` is skipped.
pub fn scan_ipv6_gateway(lines: &[String]) -> String {
    let mut in_ipv6_table = false;
    for line in lines {
        if in_ipv6_table && line.starts_with(DEFAULT_ROUTE) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() > 2 && fields[2].contains('G') {
                let gateway = fields[1].split('%').next().unwrap_or_default();
                return gateway.to_string();
            }
        } else if line.starts_with(IPV6_ROUTE_HEADER) {
            in_ipv6_table = true;
        }
    }
    String::new()
}

#[cfg(unix)]
pub use system::SystemResolver;

#[cfg(unix)]
mod system {
    use std::ffi::{CStr, CString};
    use std::mem;
    use std::ptr;

    use tracing::error;

    use super::HostResolver;

    /// Resolves through the C library (`gethostname`, `getaddrinfo`).
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemResolver;

    impl SystemResolver {
        pub fn new() -> Self {
            Self
        }
    }

    impl HostResolver for SystemResolver {
        fn host_name(&self) -> Option<String> {
            let mut buf = [0 as libc::c_char; 256];
            // SAFETY: `buf` is valid for `len` bytes; the last byte stays NUL.
            let rc = unsafe { libc::gethostname(buf.as_mut_ptr(), buf.len() - 1) };
            if rc != 0 {
                return None;
            }
            // SAFETY: gethostname wrote a NUL-terminated string into `buf`.
            let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
            let name = name.to_string_lossy().into_owned();
            (!name.is_empty()).then_some(name)
        }

        fn canonical_name(&self, host: &str) -> Option<String> {
            let node = CString::new(host).ok()?;
            // SAFETY: an all-zero addrinfo is a valid "no constraints" hint.
            let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
            hints.ai_flags = libc::AI_CANONNAME;
            let mut res: *mut libc::addrinfo = ptr::null_mut();

            // SAFETY: all pointers are valid; `res` is freed below.
            let rc = unsafe { libc::getaddrinfo(node.as_ptr(), ptr::null(), &hints, &mut res) };
            if rc != 0 {
                // SAFETY: gai_strerror returns a static string for any code.
                let reason = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) };
                error!(host, error = %reason.to_string_lossy(), "getaddrinfo failed");
                return None;
            }
            if res.is_null() {
                return None;
            }
            // SAFETY: `res` is the list head returned by getaddrinfo.
            unsafe {
                let name = (*res).ai_canonname;
                let value = (!name.is_null())
                    .then(|| CStr::from_ptr(name).to_string_lossy().into_owned());
                libc::freeaddrinfo(res);
                value
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Resolver with a fixed host name and canonical-name table.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct StaticResolver {
        pub host: Option<String>,
        pub canonical: HashMap<String, String>,
    }

    impl StaticResolver {
        pub(crate) fn new(host: &str, canonical: &str) -> Self {
            let mut resolver = Self {
                host: Some(host.to_string()),
                ..Default::default()
            };
            resolver
                .canonical
                .insert(host.to_string(), canonical.to_string());
            resolver
        }
    }

    impl HostResolver for StaticResolver {
        fn host_name(&self) -> Option<String> {
            self.host.clone()
        }

        fn canonical_name(&self, host: &str) -> Option<String> {
            self.canonical.get(host).cloned()
        }
    }

    fn lines(raw: &str) -> Vec<String> {
        raw.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_resolve_domain_name() {
        let resolver = StaticResolver::new("box", " box.example.com ");
        assert_eq!(resolve_domain_name(&resolver), "box.example.com");

        let unknown = StaticResolver {
            host: Some("box".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_domain_name(&unknown), "");
        assert_eq!(resolve_domain_name(&StaticResolver::default()), "");
    }

    #[test]
    fn test_parse_resolv_conf() {
        let content = lines(
            "# generated by NetworkManager\n\
             search example.com\n\
             nameserver 10.0.0.53\n\
             ; nameserver 10.9.9.9\n\
             nameserver   2001:4860:4860::8888\n\
             nameserver 10.0.0.53\n\
             nameserver\n\
             options edns0\n",
        );
        assert_eq!(
            parse_resolv_conf(&content),
            vec!["10.0.0.53", "2001:4860:4860::8888"]
        );
    }

    #[test]
    fn test_read_dns_servers_missing_file() {
        let fs = crate::source::mock::MockFs::new();
        assert!(read_dns_servers(&fs, Path::new("/etc/resolv.conf")).is_empty());
    }

    #[test]
    fn test_search_gateway() {
        let output = lines(
            "   route to: default\n\
             destination: default\n\
                    mask: default\n\
                 gateway: 192.168.1.1\n\
               interface: en0\n",
        );
        assert_eq!(search_gateway(&output), "192.168.1.1");
        assert_eq!(search_gateway(&lines("route: writing to routing socket: not in table")), "");
        assert_eq!(search_gateway(&[]), "");
    }

    const NETSTAT: &str = "\
Routing tables

Internet:
Destination        Gateway            Flags        Netif Expire
default            192.168.1.1        UGSc           en0
127                127.0.0.1          UCS            lo0

Internet6:
Destination                             Gateway                         Flags         Netif Expire
default                                 fe80::1%en0                     UGcg           en0
::1                                     ::1                             UHL            lo0
";

    #[test]
    fn test_scan_ipv6_gateway() {
        assert_eq!(scan_ipv6_gateway(&lines(NETSTAT)), "fe80::1");
    }

    #[test]
    fn test_scan_ipv6_gateway_requires_gateway_flag() {
        let output = lines("Internet6:\ndefault  fe80::1%en0  Uc  en0\n");
        assert_eq!(scan_ipv6_gateway(&output), "");
    }

    #[test]
    fn test_scan_ipv6_gateway_ignores_ipv4_table() {
        let output = lines("Internet:\ndefault  192.168.1.1  UGSc  en0\n");
        assert_eq!(scan_ipv6_gateway(&output), "");
    }

    #[test]
    fn test_scan_ipv6_gateway_skips_non_gateway_default() {
        let output = lines(
            "Internet6:\n\
             default  fe80::%utun0  UcI  utun0\n\
             default  fe80::1%en0   UGSc en0\n",
        );
        assert_eq!(scan_ipv6_gateway(&output), "fe80::1");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_resolver_host_name() {
        let name = SystemResolver::new().host_name();
        assert!(name.is_none_or(|n| !n.is_empty()));
    }
}
