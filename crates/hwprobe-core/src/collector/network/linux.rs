//! Network parameters on Linux, from the procfs routing tables.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{HostResolver, read_dns_servers, resolve_domain_name};
use crate::collector::procfs::{parse_ipv4_default_gateway, parse_ipv6_default_gateway};
use crate::collector::traits::NetworkCollector;
use crate::source::FileSystemExt;
use crate::source::traits::FileSystem;

pub struct LinuxNetworkCollector<F: FileSystem, H: HostResolver> {
    fs: F,
    proc_path: PathBuf,
    resolver: H,
    resolv_conf_path: PathBuf,
}

impl<F: FileSystem, H: HostResolver> LinuxNetworkCollector<F, H> {
    pub fn new(
        fs: F,
        proc_path: impl AsRef<Path>,
        resolver: H,
        resolv_conf_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            fs,
            proc_path: proc_path.as_ref().to_path_buf(),
            resolver,
            resolv_conf_path: resolv_conf_path.as_ref().to_path_buf(),
        }
    }

    fn read_route_table(&self, name: &str) -> Vec<String> {
        let lines = self.fs.read_lines(&self.proc_path.join("net").join(name));
        if lines.is_empty() {
            debug!(table = name, "routing table unavailable");
        }
        lines
    }
}

impl<F: FileSystem, H: HostResolver> NetworkCollector for LinuxNetworkCollector<F, H> {
    /// Falls back to `sys/kernel/hostname` when the resolver has no name.
    fn host_name(&self) -> String {
        self.resolver.host_name().unwrap_or_else(|| {
            let path = self.proc_path.join("sys").join("kernel").join("hostname");
            self.fs.first_line_as_string(&path).trim().to_string()
        })
    }

    fn domain_name(&self) -> String {
        resolve_domain_name(&self.resolver)
    }

    fn dns_servers(&self) -> Vec<String> {
        read_dns_servers(&self.fs, &self.resolv_conf_path)
    }

    fn ipv4_default_gateway(&self) -> String {
        parse_ipv4_default_gateway(&self.read_route_table("route"))
            .map(|gw| gw.to_string())
            .unwrap_or_default()
    }

    fn ipv6_default_gateway(&self) -> String {
        parse_ipv6_default_gateway(&self.read_route_table("ipv6_route"))
            .map(|gw| gw.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::network::tests::StaticResolver;
    use crate::source::mock::MockFs;

    const ROUTE: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
";

    const IPV6_ROUTE: &str = "\
00000000000000000000000000000000 00 00000000000000000000000000000000 00 fe800000000000000000000000000001 00000400 00000001 00000000 00000003     eth0
";

    #[test]
    fn test_params() {
        let fs = MockFs::new()
            .with_file("/proc/net/route", ROUTE)
            .with_file("/proc/net/ipv6_route", IPV6_ROUTE)
            .with_file("/etc/resolv.conf", "nameserver 1.1.1.1\nnameserver 8.8.8.8\n");
        let resolver = StaticResolver::new("node1", "node1.example.com");
        let network = LinuxNetworkCollector::new(fs, "/proc", resolver, "/etc/resolv.conf");

        let params = network.params();
        assert_eq!(params.host_name, "node1");
        assert_eq!(params.domain_name, "node1.example.com");
        assert_eq!(params.dns_servers, vec!["1.1.1.1", "8.8.8.8"]);
        if cfg!(target_endian = "little") {
            assert_eq!(params.ipv4_default_gateway, "192.168.1.1");
        }
        assert_eq!(params.ipv6_default_gateway, "fe80::1");
    }

    #[test]
    fn test_missing_tables_are_empty() {
        let network = LinuxNetworkCollector::new(
            MockFs::new(),
            "/proc",
            StaticResolver::default(),
            "/etc/resolv.conf",
        );
        assert_eq!(network.ipv4_default_gateway(), "");
        assert_eq!(network.ipv6_default_gateway(), "");
        assert!(network.dns_servers().is_empty());
        assert_eq!(network.host_name(), "");
    }

    #[test]
    fn test_host_name_from_kernel() {
        let fs = MockFs::new().with_file("/proc/sys/kernel/hostname", "worker-7\n");
        let network = LinuxNetworkCollector::new(
            fs,
            "/proc",
            StaticResolver::default(),
            "/etc/resolv.conf",
        );
        assert_eq!(network.host_name(), "worker-7");
    }
}
