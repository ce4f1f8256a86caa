use serde::{Deserialize, Serialize};
use std::fmt;

/// How the cluster publishes its API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DnsMode {
    /// The API endpoint is a DNS record maintained by an external-DNS deployment
    Dns,
    /// Peer discovery via gossip; no API DNS record to check
    Gossip,
    /// No DNS at all (direct addressing)
    None,
}

impl Default for DnsMode {
    fn default() -> Self {
        DnsMode::Dns
    }
}

/// Which deployment maintains the cluster's DNS records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExternalDnsProvider {
    DnsController,
    ExternalDns,
}

impl fmt::Display for ExternalDnsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalDnsProvider::DnsController => write!(f, "dns-controller"),
            ExternalDnsProvider::ExternalDns => write!(f, "external-dns"),
        }
    }
}

/// Descriptor of the cluster under validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Cluster name
    pub name: String,
    /// How the API endpoint is published
    #[serde(default)]
    pub dns_mode: DnsMode,
    /// DNS deployment responsible for the API record, when not the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_dns: Option<ExternalDnsProvider>,
    /// Advertised API endpoint, as an absolute URL
    pub api_host: String,
}

impl ClusterSpec {
    /// Create a DNS-discovered cluster descriptor
    pub fn new(name: impl Into<String>, api_host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dns_mode: DnsMode::Dns,
            external_dns: None,
            api_host: api_host.into(),
        }
    }

    /// Whether the cluster relies on DNS-based discovery
    ///
    /// Gossip and DNS-less topologies have no API DNS record, so the
    /// placeholder-endpoint check does not apply to them.
    pub fn uses_dns_discovery(&self) -> bool {
        self.dns_mode == DnsMode::Dns
    }

    /// The deployment maintaining the API record; dns-controller unless overridden
    pub fn external_dns_provider(&self) -> ExternalDnsProvider {
        self.external_dns
            .unwrap_or(ExternalDnsProvider::DnsController)
    }
}
