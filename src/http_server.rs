use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::{checker::DnssecChecker, model::CheckParams, response::CheckResponse};

type ServeResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// HTTP front end exposing `/check` and `/healthz`
pub struct HttpServer {
    checker: Arc<DnssecChecker>,
    bind_addr: SocketAddr,
    enable_cors: bool,
    shutdown: CancellationToken,
}

impl HttpServer {
    pub fn new(
        checker: Arc<DnssecChecker>,
        bind_addr: SocketAddr,
        enable_cors: bool,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            checker,
            bind_addr,
            enable_cors,
            shutdown,
        }
    }

    /// Start the HTTP server
    pub async fn start(self) -> ServeResult {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until the shutdown token fires
    pub async fn serve(self, listener: TcpListener) -> ServeResult {
        let app = router(self.checker, self.enable_cors);

        info!("Starting HTTP server on {}", listener.local_addr()?);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("HTTP server shutting down");
            })
            .await?;

        Ok(())
    }
}

/// Build the application router
pub fn router(checker: Arc<DnssecChecker>, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/check", get(check))
        .route("/healthz", get(healthz))
        .with_state(checker);

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

async fn check(
    State(checker): State<Arc<DnssecChecker>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> CheckResponse {
    let params = CheckParams::from_pairs(pairs);
    debug!(
        "GET /check domain={:?} dns={:?} timeout={:?}",
        params.domain, params.dns, params.timeout
    );
    checker.check(&params).await
}

/// Liveness only, touches nothing
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
