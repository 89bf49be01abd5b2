use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dnssec_checker::{
    DnssecChecker,
    config::CheckerConfig,
    http_server::HttpServer,
    query::{QueryBackend, build_backend},
    shutdown,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// HTTP service reporting whether a domain's DNSSEC answer is validated by a resolver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on (overrides DNSSEC_CHECKER_HTTP_BIND_ADDR)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Query backend: native or dig
    #[arg(long)]
    backend: Option<QueryBackend>,

    /// Resolver used when a request omits `dns`
    #[arg(long)]
    default_dns: Option<String>,

    /// Timeout in seconds used when a request omits `timeout`
    #[arg(long)]
    default_timeout: Option<u64>,

    /// Port of the upstream resolvers
    #[arg(long)]
    resolver_port: Option<u16>,

    /// dig executable for the dig backend
    #[arg(long)]
    dig_path: Option<String>,

    /// Log filter directive, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = CheckerConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.http_bind_addr = bind;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(dns) = args.default_dns {
        config.default_dns = dns;
    }
    if let Some(timeout) = args.default_timeout {
        config.default_timeout = timeout;
    }
    if let Some(port) = args.resolver_port {
        config.resolver_port = port;
    }
    if let Some(dig_path) = args.dig_path {
        config.dig_path = dig_path;
    }
    config.validate()?;

    info!(
        "Configuration: bind={}, backend={}, default_dns={}, default_timeout={}s, resolver_port={}, edns_buffer_size={}, cors={}",
        config.http_bind_addr,
        config.backend,
        config.default_dns,
        config.default_timeout,
        config.resolver_port,
        config.edns_buffer_size,
        config.enable_cors
    );

    let shutdown_token = CancellationToken::new();
    tokio::spawn(shutdown::cancel_on(
        shutdown::wait_for_signal(),
        shutdown_token.clone(),
    ));

    let checker = Arc::new(DnssecChecker::new(
        build_backend(&config),
        config.check_defaults(),
        shutdown_token.clone(),
    ));

    let server = HttpServer::new(
        checker,
        config.http_bind_addr,
        config.enable_cors,
        shutdown_token,
    );

    if let Err(e) = server.start().await {
        error!("HTTP server error: {}", e);
        return Err(e as Box<dyn std::error::Error>);
    }

    info!("Shutdown complete");
    Ok(())
}
