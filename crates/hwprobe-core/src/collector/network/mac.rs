//! Network parameters on macOS, from `route` and `netstat`.

use std::path::{Path, PathBuf};

use super::{HostResolver, read_dns_servers, resolve_domain_name, scan_ipv6_gateway, search_gateway};
use crate::collector::traits::NetworkCollector;
use crate::source::command::CommandRunner;
use crate::source::traits::FileSystem;

const ROUTE_COMMAND: &str = "route -n get default";
const NETSTAT_COMMAND: &str = "netstat -nr";

pub struct MacNetworkCollector<F: FileSystem, R: CommandRunner, H: HostResolver> {
    fs: F,
    runner: R,
    resolver: H,
    resolv_conf_path: PathBuf,
}

impl<F: FileSystem, R: CommandRunner, H: HostResolver> MacNetworkCollector<F, R, H> {
    pub fn new(fs: F, runner: R, resolver: H, resolv_conf_path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            runner,
            resolver,
            resolv_conf_path: resolv_conf_path.as_ref().to_path_buf(),
        }
    }
}

impl<F: FileSystem, R: CommandRunner, H: HostResolver> NetworkCollector
    for MacNetworkCollector<F, R, H>
{
    fn host_name(&self) -> String {
        self.resolver.host_name().unwrap_or_default()
    }

    fn domain_name(&self) -> String {
        resolve_domain_name(&self.resolver)
    }

    fn dns_servers(&self) -> Vec<String> {
        read_dns_servers(&self.fs, &self.resolv_conf_path)
    }

    fn ipv4_default_gateway(&self) -> String {
        search_gateway(&self.runner.run_command(ROUTE_COMMAND))
    }

    fn ipv6_default_gateway(&self) -> String {
        scan_ipv6_gateway(&self.runner.run_command(NETSTAT_COMMAND))
    }
}
