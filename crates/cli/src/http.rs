//! Stateless streamable-HTTP transport and health endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use evaluator::EvaluateToolCall;
use mcp::Server;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;

/// The MCP server shared by every request handler.
pub type SharedServer = Arc<Server<EvaluateToolCall>>;

/// Routes: `GET /health`, `POST /mcp` and `POST /mcp/`.
pub fn router(server: SharedServer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/mcp", post(handle_mcp))
        .route("/mcp/", post(handle_mcp))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, server: SharedServer) -> Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "MCP endpoint at http://{addr}/mcp");

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

// --- HANDLERS ---

async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn handle_mcp(State(server): State<SharedServer>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluator::{Evaluator, ModelSize};

    async fn spawn_server() -> String {
        let evaluator = Evaluator::builder()
            .endpoint(ModelSize::Small, "http://127.0.0.1:9/unreachable")
            .build()
            .unwrap();
        let server = Arc::new(Server::new(
            "toolcheck",
            "test",
            EvaluateToolCall::new(evaluator),
        ));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(server)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let base = spawn_server().await;
        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn initialize_over_http() {
        let base = spawn_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/mcp/"))
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {"protocolVersion": "2025-03-26", "capabilities": {}}
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["serverInfo"]["name"], "toolcheck");
    }

    #[tokio::test]
    async fn notification_is_accepted_without_body() {
        let base = spawn_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/mcp"))
            .json(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);
        assert!(resp.text().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_json_gets_parse_error() {
        let base = spawn_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/mcp"))
            .body("not json")
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], mcp::error_codes::PARSE_ERROR);
    }
}
