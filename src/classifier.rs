//! Outcome classification of a resolver's answer.
//!
//! The answer counts as validated when the resolver set the AD flag and the
//! answer carries an RRSIG owned by the queried name. This is textual
//! evidence of the resolver's own validation, not a chain-of-trust walk.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::NormalizedDomain;
use crate::query::{QueryTermination, RawQueryResult};

/// `;; flags: qr rd ra ad; QUERY: ...` with `ad` among the flags
static AD_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^;;\s*flags:[^;\n]*\bad\b").expect("AD flag pattern is valid")
});

/// `<owner> <ttl> IN RRSIG ...`, capturing the owner
static RRSIG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\S+)\s+\d+\s+IN\s+RRSIG\b").expect("RRSIG pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    Timeout,
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Valid => "valid",
            Verdict::Invalid => "invalid",
            Verdict::Timeout => "timeout",
            Verdict::Error => "error",
        }
    }
}

/// Classification result; `diagnostic` is the raw output, the timeout
/// message, or the error description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub diagnostic: String,
}

pub fn has_ad_flag(text: &str) -> bool {
    AD_FLAG.is_match(text)
}

/// True if any RRSIG record line is owned by `domain`
pub fn has_rrsig_for(text: &str, domain: &NormalizedDomain) -> bool {
    let wanted = domain.fqdn();
    RRSIG_LINE.captures_iter(text).any(|caps| {
        let owner = caps[1].trim_end_matches('.');
        wanted.trim_end_matches('.').eq_ignore_ascii_case(owner)
    })
}

pub fn classify(raw: RawQueryResult, domain: &NormalizedDomain) -> Outcome {
    let verdict = match raw.termination {
        QueryTermination::TimedOut => Verdict::Timeout,
        QueryTermination::Failed => Verdict::Error,
        QueryTermination::Completed => {
            if has_ad_flag(&raw.text) && has_rrsig_for(&raw.text, domain) {
                Verdict::Valid
            } else {
                Verdict::Invalid
            }
        }
    };

    Outcome {
        verdict,
        diagnostic: raw.text,
    }
}
