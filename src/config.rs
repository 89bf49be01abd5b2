use crate::error::ConfigError;
use crate::model::{CheckDefaults, DEFAULT_DNS, DEFAULT_TIMEOUT_SECS};
use crate::query::QueryBackend;
use crate::validation::is_valid_ip;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Address the HTTP server listens on
    pub http_bind_addr: SocketAddr,

    /// Resolver queried when a request has no `dns` parameter
    pub default_dns: String,

    /// Timeout in seconds when a request has no `timeout` parameter
    pub default_timeout: u64,

    /// Port the upstream resolver listens on
    pub resolver_port: u16,

    /// How queries are executed
    pub backend: QueryBackend,

    /// dig executable used by the dig backend
    pub dig_path: String,

    /// UDP payload size advertised in the EDNS0 OPT record
    pub edns_buffer_size: u16,

    /// Whether to attach a permissive CORS layer
    pub enable_cors: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            http_bind_addr: "[::]:8080"
                .parse()
                .expect("Default HTTP bind address is valid"),
            default_dns: DEFAULT_DNS.to_string(),
            default_timeout: DEFAULT_TIMEOUT_SECS,
            resolver_port: 53,
            backend: QueryBackend::Native,
            dig_path: "dig".to_string(),
            edns_buffer_size: 1232, // DNS flag day 2020
            enable_cors: true,
        }
    }
}

impl CheckerConfig {
    /// Create a CheckerConfig from environment variables
    /// Returns Err if critical configuration is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind_addr) = lookup("DNSSEC_CHECKER_HTTP_BIND_ADDR") {
            config.http_bind_addr = bind_addr
                .parse()
                .map_err(|_| ConfigError::InvalidHttpBindAddress(bind_addr))?;
        }

        if let Some(default_dns) = lookup("DNSSEC_CHECKER_DEFAULT_DNS") {
            config.default_dns = default_dns.trim().to_string();
        }

        if let Some(timeout_str) = lookup("DNSSEC_CHECKER_DEFAULT_TIMEOUT") {
            config.default_timeout = timeout_str
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(timeout_str.clone()))?;
        }

        if let Some(port) = lookup("DNSSEC_CHECKER_RESOLVER_PORT") {
            config.resolver_port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidResolverPort(port.clone()))?;
        }

        if let Some(backend) = lookup("DNSSEC_CHECKER_BACKEND") {
            config.backend = backend.parse()?;
        }

        if let Some(dig_path) = lookup("DNSSEC_CHECKER_DIG_PATH") {
            if !dig_path.is_empty() {
                config.dig_path = dig_path;
            }
        }

        if let Some(size) = lookup("DNSSEC_CHECKER_EDNS_BUFFER_SIZE") {
            config.edns_buffer_size = size
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidEdnsBufferSize(size.clone()))?;
        }

        if let Some(enable_cors) = lookup("DNSSEC_CHECKER_ENABLE_CORS") {
            config.enable_cors = parse_bool(&enable_cors, true);
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_ip(&self.default_dns) {
            return Err(ConfigError::InvalidDefaultResolver(self.default_dns.clone()));
        }

        if self.default_timeout == 0 {
            return Err(ConfigError::InvalidTimeout(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.resolver_port == 0 {
            return Err(ConfigError::InvalidResolverPort(
                "Port must be greater than 0".to_string(),
            ));
        }

        // Below 512 is not a valid EDNS size, above 4096 invites fragmentation
        if !(512..=4096).contains(&self.edns_buffer_size) {
            return Err(ConfigError::InvalidEdnsBufferSize(format!(
                "{} (expected 512-4096)",
                self.edns_buffer_size
            )));
        }

        Ok(())
    }

    pub fn check_defaults(&self) -> CheckDefaults {
        CheckDefaults {
            dns: self.default_dns.clone(),
            timeout_secs: self.default_timeout,
        }
    }
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}
