//! HTTP server lifecycle.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. `run_server` is the foreground variant used by `main`, which
//! stays up until Ctrl-C.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Bind `addr` and serve the API in a background task.
///
/// Binding to port 0 picks an ephemeral port; the bound address is
/// available on the returned handle.
pub async fn start_server(ctx: ApiContext, addr: SocketAddr) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

/// Serve the API in the foreground until Ctrl-C.
pub async fn run_server(ctx: ApiContext, addr: SocketAddr) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;

    let bound = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(addr = %bound, "API server listening");

    let app = api_router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await
        .map_err(|e| format!("API server error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{CLASS_LABELS, MODEL_INPUT_SIZE};
    use crate::db::open_memory_database;
    use crate::inference::{ImagePreprocessor, InferencePipeline, MockClassifier};
    use crate::intake::IntakeService;

    fn test_ctx() -> (ApiContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let conn = open_memory_database().unwrap();
        let pipeline = Arc::new(InferencePipeline::new(
            ImagePreprocessor::new(MODEL_INPUT_SIZE),
            Arc::new(MockClassifier::new(CLASS_LABELS.len())),
            &CLASS_LABELS,
        ));
        let intake = Arc::new(IntakeService::new(tmp.path().to_path_buf(), pipeline));
        (ApiContext::new(conn, intake), tmp)
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let (ctx, _tmp) = test_ctx();
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut server = start_server(ctx, addr).await.expect("server should start");
        assert!(server.addr.port() > 0);

        let response = raw_get(server.addr, "/api/stats").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("totalPatients"));

        server.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn unknown_route_is_404_over_the_wire() {
        let (ctx, _tmp) = test_ctx();
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut server = start_server(ctx, addr).await.expect("server should start");

        let response = raw_get(server.addr, "/nonexistent").await;
        assert!(response.starts_with("HTTP/1.1 404"));

        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (ctx, _tmp) = test_ctx();
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut server = start_server(ctx, addr).await.expect("server should start");

        server.shutdown();
        server.shutdown();
    }
}
