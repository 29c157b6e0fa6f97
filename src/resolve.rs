use crate::TraceError;
use std::net::{IpAddr, Ipv4Addr};

/// Forward-resolves the destination once, before the sweep starts. A literal
/// IPv4 address is taken as-is; otherwise the first IPv4 record wins.
pub fn resolve_destination(destination: &str) -> Result<Ipv4Addr, TraceError> {
    if let Ok(literal) = destination.parse::<Ipv4Addr>() {
        return Ok(literal);
    }

    let addresses =
        dns_lookup::lookup_host(destination).map_err(|e| TraceError::ResolutionFailure {
            destination: destination.to_owned(),
            cause: e.to_string(),
        })?;
    addresses
        .into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| TraceError::ResolutionFailure {
            destination: destination.to_owned(),
            cause: "no IPv4 address found".to_owned(),
        })
}

/// Reverse-DNS beautification: `hostname (ip)` when a PTR record exists, the
/// bare address otherwise. One blocking call, no retry, no cache.
pub fn display_name(ip: IpAddr) -> String {
    match dns_lookup::lookup_addr(&ip) {
        Ok(hostname) if hostname != ip.to_string() => format!("{hostname} ({ip})"),
        _ => ip.to_string(),
    }
}
