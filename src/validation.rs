//! Request validation. Everything here runs before any network I/O and
//! turns raw query parameters into a [`CheckRequest`] or a client error.

use std::net::IpAddr;

use crate::domain::normalize_domain;
use crate::error::CheckError;
use crate::model::{CheckDefaults, CheckParams, CheckRequest};

/// True only for IPv4 or IPv6 address literals. No name resolution.
pub fn is_valid_ip(address: &str) -> bool {
    address.parse::<IpAddr>().is_ok()
}

/// Parse a timeout in whole seconds; zero, negative and non-integer values
/// are rejected with the raw text in the error.
pub fn parse_timeout(raw: &str) -> Result<u64, CheckError> {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(secs as u64),
        _ => Err(CheckError::InvalidTimeout(raw.to_string())),
    }
}

/// Validate raw parameters in the order clients observe errors: missing
/// domain, timeout, domain, resolver.
pub fn validate_request(
    params: &CheckParams,
    defaults: &CheckDefaults,
) -> Result<CheckRequest, CheckError> {
    let domain = match params.domain.as_deref() {
        Some(domain) if !domain.is_empty() => domain,
        _ => return Err(CheckError::MissingDomain),
    };

    let timeout_secs = match params.timeout.as_deref() {
        Some(raw) => parse_timeout(raw)?,
        None => defaults.timeout_secs,
    };

    let ascii_domain =
        normalize_domain(domain).ok_or_else(|| CheckError::InvalidDomain(domain.to_string()))?;

    let dns = params.dns.clone().unwrap_or_else(|| defaults.dns.clone());
    let resolver = dns
        .parse::<IpAddr>()
        .map_err(|_| CheckError::InvalidResolver(dns.clone()))?;

    Ok(CheckRequest {
        domain: domain.to_string(),
        ascii_domain,
        dns,
        resolver,
        timeout_secs,
    })
}
