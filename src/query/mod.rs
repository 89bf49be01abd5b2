//! DNSSEC query execution against an upstream resolver.
//!
//! Backends only report how a query terminated and what text it produced;
//! interpreting that text is the classifier's job.

pub mod dig;
pub mod native;

use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::CheckerConfig;
use crate::domain::NormalizedDomain;
use crate::error::{ConfigError, QueryError};

pub use dig::DigQuery;
pub use native::NativeQuery;

/// Diagnostic text attached to a query that ran out of time
pub const TIMEOUT_MESSAGE: &str = "Timeout: DNSSEC check exceeded timeout limit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTermination {
    Completed,
    TimedOut,
    Failed,
}

/// Text produced by a query, and how the query ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQueryResult {
    pub termination: QueryTermination,
    pub text: String,
}

impl RawQueryResult {
    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            termination: QueryTermination::Completed,
            text: text.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self {
            termination: QueryTermination::TimedOut,
            text: TIMEOUT_MESSAGE.to_string(),
        }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            termination: QueryTermination::Failed,
            text: description.into(),
        }
    }
}

/// Ask a resolver for the DNSSEC material of a name
#[async_trait]
pub trait DnssecQuery: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Query `domain` at `resolver`, giving up after `limit`. Never fails:
    /// timeouts and execution errors are folded into the result.
    async fn query(
        &self,
        domain: &NormalizedDomain,
        resolver: IpAddr,
        limit: Duration,
    ) -> RawQueryResult;
}

/// Run an exchange under a hard deadline. Dropping the exchange future on
/// expiry closes its socket or kills its child process.
pub(crate) async fn bounded<F>(limit: Duration, exchange: F) -> RawQueryResult
where
    F: Future<Output = Result<String, QueryError>>,
{
    match timeout(limit, exchange).await {
        Ok(Ok(text)) => RawQueryResult::completed(text),
        Ok(Err(e)) => {
            error!("DNSSEC query failed: {}", e);
            RawQueryResult::failed(e.to_string())
        }
        Err(_) => {
            debug!("DNSSEC query exceeded {:?}", limit);
            RawQueryResult::timed_out()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryBackend {
    /// Built-in wire client
    #[default]
    Native,
    /// External `dig` tool
    Dig,
}

impl FromStr for QueryBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(QueryBackend::Native),
            "dig" => Ok(QueryBackend::Dig),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for QueryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryBackend::Native => write!(f, "native"),
            QueryBackend::Dig => write!(f, "dig"),
        }
    }
}

/// Instantiate the backend selected in the configuration
pub fn build_backend(config: &CheckerConfig) -> Arc<dyn DnssecQuery> {
    match config.backend {
        QueryBackend::Native => Arc::new(NativeQuery::new(
            config.resolver_port,
            config.edns_buffer_size,
        )),
        QueryBackend::Dig => Arc::new(DigQuery::new(
            config.dig_path.clone(),
            config.resolver_port,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_completed() {
        let result = bounded(Duration::from_secs(1), async { Ok("answer".to_string()) }).await;
        assert_eq!(result, RawQueryResult::completed("answer"));
    }

    #[tokio::test]
    async fn test_bounded_failed() {
        let result = bounded(Duration::from_secs(1), async { Err(QueryError::Cancelled) }).await;
        assert_eq!(result.termination, QueryTermination::Failed);
        assert_eq!(result.text, "Query aborted: server is shutting down");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let result = bounded(Duration::from_secs(2), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        })
        .await;
        assert_eq!(result, RawQueryResult::timed_out());
        assert_eq!(result.text, TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_backend_names() {
        assert_eq!("native".parse::<QueryBackend>(), Ok(QueryBackend::Native));
        assert_eq!(" DIG ".parse::<QueryBackend>(), Ok(QueryBackend::Dig));
        assert!("doh".parse::<QueryBackend>().is_err());
        assert_eq!(QueryBackend::Dig.to_string(), "dig");
    }
}
