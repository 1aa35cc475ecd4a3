//! HTTP server setup.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;

/// Full application: routes plus CORS and request tracing.
pub fn app(state: AppState) -> Router {
    routes::create_routes(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until `shutdown_signal` resolves.
pub async fn run_server_with_shutdown<F>(
    addr: SocketAddr,
    state: AppState,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, shutdown_signal).await
}

/// Serve on an already bound listener until `shutdown_signal` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("HTTP server ready on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use support_agent::{SessionStore, SupportAgent};
    use support_embeddings::HashEmbedder;
    use support_index::FaqIndex;
    use support_llm::MockChatModel;
    use support_types::AnonymousSessionPolicy;

    #[tokio::test]
    async fn test_serves_ping_until_shutdown() {
        let index = FaqIndex::build(Vec::new(), Arc::new(HashEmbedder::default())).unwrap();
        let agent = SupportAgent::new(
            Arc::new(index),
            Arc::new(MockChatModel::new()),
            Arc::new(SessionStore::default()),
            Default::default(),
        );
        let state = AppState::new(Arc::new(agent), AnonymousSessionPolicy::Generate);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200"));
        assert!(raw.ends_with(r#"{"status":"ok"}"#));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
