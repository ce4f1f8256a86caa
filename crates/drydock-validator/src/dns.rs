use crate::error::{Result, ValidatorError};
use crate::traits::HostResolver;
use drydock_core::{ExternalDnsProvider, FailureKind, ValidationFailure};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// IPv4 sentinel published for the API record before the control plane is up
pub const PLACEHOLDER_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 123));

/// IPv6 counterpart of [`PLACEHOLDER_IP`]
pub const PLACEHOLDER_IPV6: IpAddr =
    IpAddr::V6(Ipv6Addr::new(0xfd00, 0xdead, 0xbeef, 0, 0, 0, 0, 1));

/// Check whether the API DNS record still points at a bootstrap sentinel
///
/// Returns the matching placeholder address, or `None` when the record has
/// been updated to a real endpoint. An unparsable or unresolvable host is a
/// fatal error.
pub async fn find_placeholder_address(
    resolver: &dyn HostResolver,
    api_host: &str,
) -> Result<Option<IpAddr>> {
    let api_url = url::Url::parse(api_host)
        .map_err(|e| ValidatorError::api_host_invalid(api_host, e.to_string()))?;
    let hostname = api_url
        .host_str()
        .ok_or_else(|| ValidatorError::api_host_invalid(api_host, "URL has no host"))?;

    let mut addresses = resolver.resolve(hostname).await?;
    addresses.sort();
    debug!(host = hostname, ?addresses, "resolved API host");

    Ok(addresses
        .into_iter()
        .find(|a| *a == PLACEHOLDER_IP || *a == PLACEHOLDER_IPV6))
}

/// Build the single failure recorded when the placeholder is still active
pub fn placeholder_failure(
    provider: ExternalDnsProvider,
    address: IpAddr,
) -> ValidationFailure {
    let message = format!(
        "Validation Failed\n\n\
         The {provider} deployment has not updated the cluster's API DNS entry to \
         the correct IP address. The API DNS record still resolves to the bootstrap \
         placeholder address {address}. Wait a few minutes for a control plane node \
         to start, {provider} to launch, and DNS to propagate; the {provider} \
         deployment logs may contain more diagnostic information."
    );
    ValidationFailure {
        kind: FailureKind::Dns,
        name: "apiserver".to_string(),
        message,
        instance_group: None,
    }
}
