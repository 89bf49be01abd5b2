use std::net::IpAddr;
use std::time::Duration;

use crate::domain::NormalizedDomain;

/// Resolver used when a request does not name one (Quad9)
pub const DEFAULT_DNS: &str = "9.9.9.9";

/// Query timeout used when a request does not give one
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Raw `/check` query string parameters, exactly as the client sent them
#[derive(Debug, Clone, Default)]
pub struct CheckParams {
    pub domain: Option<String>,
    pub dns: Option<String>,
    pub timeout: Option<String>,
}

impl CheckParams {
    /// Collect parameters from decoded query string pairs. A repeated key
    /// keeps its first value, unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "domain" => &mut params.domain,
                "dns" => &mut params.dns,
                "timeout" => &mut params.timeout,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// Values substituted for absent request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDefaults {
    pub dns: String,
    pub timeout_secs: u64,
}

impl Default for CheckDefaults {
    fn default() -> Self {
        Self {
            dns: DEFAULT_DNS.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A fully validated check request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// Domain as the client wrote it
    pub domain: String,
    pub ascii_domain: NormalizedDomain,
    /// Resolver as the client wrote it, echoed back verbatim
    pub dns: String,
    pub resolver: IpAddr,
    pub timeout_secs: u64,
}

impl CheckRequest {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
