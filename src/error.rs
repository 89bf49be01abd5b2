use thiserror::Error;

use crate::dns::ParseError;

/// Rejections of a check request before any query is sent. The display text
/// is the message returned to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Missing 'domain' query parameter")]
    MissingDomain,

    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    #[error("Invalid DNS server IP: {0}")]
    InvalidResolver(String),
}

/// Failures to obtain an answer from the upstream resolver
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build query: {0}")]
    Encode(ParseError),

    #[error("Failed to parse response: {0}")]
    Parse(ParseError),

    #[error("Response from {0} is not an answer to our query")]
    UnexpectedResponse(String),

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Query aborted: server is shutting down")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid HTTP bind address: {0}")]
    InvalidHttpBindAddress(String),

    #[error("Invalid default DNS server: {0}")]
    InvalidDefaultResolver(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid resolver port: {0}")]
    InvalidResolverPort(String),

    #[error("Invalid EDNS buffer size: {0}")]
    InvalidEdnsBufferSize(String),

    #[error("Unknown query backend: {0}")]
    UnknownBackend(String),
}
