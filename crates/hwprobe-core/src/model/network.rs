use serde::{Deserialize, Serialize};

/// Network configuration of the local host.
///
/// Each field is resolved independently; an unresolvable value is an empty
/// string (or empty list), never an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub host_name: String,
    pub domain_name: String,
    pub dns_servers: Vec<String>,
    pub ipv4_default_gateway: String,
    pub ipv6_default_gateway: String,
}
