use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Resolve once SIGINT (or SIGTERM on unix) arrives
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Cancel `token` when `signal` completes. Every holder of a child or clone
/// of the token observes the cancellation: the HTTP server stops accepting
/// and in-flight checks abandon their query.
pub async fn cancel_on<F>(signal: F, token: CancellationToken)
where
    F: std::future::Future<Output = ()>,
{
    tokio::select! {
        _ = signal => {
            info!("Initiating graceful shutdown...");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_signal_cancels_token() {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(cancel_on(
            async move {
                let _ = rx.await;
            },
            token.clone(),
        ));

        assert!(!token.is_cancelled());
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_returns_when_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let task = tokio::spawn(cancel_on(std::future::pending(), token.clone()));
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
