use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{DnssecQuery, RawQueryResult, bounded};
use crate::domain::NormalizedDomain;
use crate::error::QueryError;

/// Runs `dig +dnssec <domain> @<resolver>` and returns what it printed.
///
/// dig's exit status is ignored: when it cannot get an answer it says so on
/// its output, and that text is classified like any other response.
#[derive(Debug, Clone)]
pub struct DigQuery {
    program: String,
    port: u16,
}

impl DigQuery {
    pub fn new(program: impl Into<String>, port: u16) -> Self {
        Self {
            program: program.into(),
            port,
        }
    }

    fn command(&self, domain: &NormalizedDomain, resolver: IpAddr) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("+dnssec")
            .arg(domain.as_str())
            .arg(format!("@{}", resolver));
        if self.port != 53 {
            cmd.arg("-p").arg(self.port.to_string());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn exchange(&self, domain: &NormalizedDomain, resolver: IpAddr) -> Result<String, QueryError> {
        debug!("Running {} +dnssec {} @{}", self.program, domain, resolver);
        let output = self
            .command(domain, resolver)
            .output()
            .await
            .map_err(|source| QueryError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        trace!(
            "{} exited with {} ({} bytes stdout, {} bytes stderr)",
            self.program,
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

#[async_trait]
impl DnssecQuery for DigQuery {
    fn name(&self) -> &'static str {
        "dig"
    }

    async fn query(
        &self,
        domain: &NormalizedDomain,
        resolver: IpAddr,
        limit: Duration,
    ) -> RawQueryResult {
        bounded(limit, self.exchange(domain, resolver)).await
    }
}
