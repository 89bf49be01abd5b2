use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::classifier::{Verdict, classify};
use crate::error::QueryError;
use crate::model::{CheckDefaults, CheckParams, CheckRequest};
use crate::query::{DnssecQuery, RawQueryResult};
use crate::response::CheckResponse;
use crate::validation::validate_request;

/// Runs a check end to end: validation, bounded query, classification and
/// response assembly. Holds no per-request state.
pub struct DnssecChecker {
    backend: Arc<dyn DnssecQuery>,
    defaults: CheckDefaults,
    shutdown: CancellationToken,
}

impl DnssecChecker {
    pub fn new(
        backend: Arc<dyn DnssecQuery>,
        defaults: CheckDefaults,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            backend,
            defaults,
            shutdown,
        }
    }

    pub async fn check(&self, params: &CheckParams) -> CheckResponse {
        match validate_request(params, &self.defaults) {
            Ok(request) => self.run(&request).await,
            Err(e) => {
                info!("Rejected check request: {}", e);
                CheckResponse::client_error(&e)
            }
        }
    }

    /// Query and classify a validated request
    pub async fn run(&self, request: &CheckRequest) -> CheckResponse {
        let started = Instant::now();

        // An in-flight query is abandoned as soon as shutdown begins
        let raw = tokio::select! {
            raw = self.backend.query(&request.ascii_domain, request.resolver, request.timeout()) => raw,
            _ = self.shutdown.cancelled() => RawQueryResult::failed(QueryError::Cancelled.to_string()),
        };

        let outcome = classify(raw, &request.ascii_domain);
        let elapsed = started.elapsed();
        match outcome.verdict {
            Verdict::Valid => info!(
                "DNSSEC check for {} via {} ({}): valid in {:?}",
                request.ascii_domain, request.dns, self.backend.name(), elapsed
            ),
            Verdict::Invalid | Verdict::Timeout => warn!(
                "DNSSEC check for {} via {} ({}): {} in {:?}",
                request.ascii_domain,
                request.dns,
                self.backend.name(),
                outcome.verdict.as_str(),
                elapsed
            ),
            Verdict::Error => error!(
                "DNSSEC check for {} via {} ({}) failed: {}",
                request.ascii_domain,
                request.dns,
                self.backend.name(),
                outcome.diagnostic
            ),
        }

        CheckResponse::from_outcome(outcome, request)
    }
}
