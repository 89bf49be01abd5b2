//! Mapping of check outcomes to HTTP status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::classifier::{Outcome, Verdict};
use crate::error::CheckError;
use crate::model::CheckRequest;

pub const INVALID_MESSAGE: &str = "DNSSEC records are missing or not validated";
pub const TIMEOUT_MESSAGE: &str = "DNSSEC validation timed out";
pub const ERROR_MESSAGE: &str = "DNSSEC validation failed due to system error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub domain: String,
    pub ascii_domain: String,
    pub dns: String,
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Verdict(VerdictBody),
    Error(ErrorBody),
}

/// Status code plus JSON payload of a `/check` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl CheckResponse {
    /// Map a classified outcome to its response
    pub fn from_outcome(outcome: Outcome, request: &CheckRequest) -> Self {
        let (status, label, message, output) = match outcome.verdict {
            Verdict::Valid => (StatusCode::OK, "valid", None, None),
            Verdict::Invalid => (
                StatusCode::BAD_REQUEST,
                "invalid",
                Some(INVALID_MESSAGE),
                Some(outcome.diagnostic),
            ),
            Verdict::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "error",
                Some(TIMEOUT_MESSAGE),
                Some(outcome.diagnostic),
            ),
            Verdict::Error => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                Some(ERROR_MESSAGE),
                Some(outcome.diagnostic),
            ),
        };

        Self {
            status,
            body: ResponseBody::Verdict(VerdictBody {
                status: label,
                message,
                domain: request.domain.clone(),
                ascii_domain: request.ascii_domain.to_string(),
                dns: request.dns.clone(),
                timeout: request.timeout_secs,
                output,
            }),
        }
    }

    /// A request rejected before any query was made
    pub fn client_error(error: &CheckError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ResponseBody::Error(ErrorBody {
                error: error.to_string(),
            }),
        }
    }
}

impl IntoResponse for CheckResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
