// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::MeshError;
use crate::mcp::{McpBridge, McpRequest, McpResponse, protocol};
use crate::store::{EventBus as _, Services};
use crate::workflow::{WorkflowDefinition, WorkflowEngine};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<McpBridge>,
    pub services: Services,
    pub engine: WorkflowEngine,
}

pub async fn serve(port: u16, state: AppState) -> Result<(), MeshError> {
    // tower-http's trace layer emits tracing events; give them a subscriber
    let _ = tracing_subscriber::fmt().try_init();

    let app = Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/events/stream", get(stream_events))
        .route("/api/workflows/execute", post(execute_workflow))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(MeshError::Io)?;
    axum::serve(listener, app).await.map_err(MeshError::Io)?;

    Ok(())
}

async fn handle_mcp(State(state): State<AppState>, Json(payload): Json<Value>) -> impl IntoResponse {
    // Parse the envelope ourselves so malformed requests get a JSON-RPC
    // error instead of a bare 422
    let request: McpRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            let response = McpResponse::failure(
                None,
                crate::mcp::McpError::InvalidRequest(err.to_string()),
            );
            return Json(response).into_response();
        }
    };

    match state.bridge.handle(request).await {
        Some(response) => Json(response).into_response(),
        // Notification: acknowledged, nothing to say
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn server_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": protocol::SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.bridge.handlers().len()
    }))
}

#[derive(Deserialize)]
struct ExecuteRequest {
    workflow: WorkflowDefinition,
}

async fn execute_workflow(
    State(state): State<AppState>,
    Json(payload): Json<ExecuteRequest>,
) -> Json<Value> {
    log::info!("Executing workflow '{}' via HTTP", payload.workflow.name);
    let result = state.engine.execute(&payload.workflow).await;
    match serde_json::to_value(&result) {
        Ok(value) => Json(value),
        Err(err) => Json(json!({"error": err.to_string()})),
    }
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut events = state.services.events.subscribe();
    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        // Client hung up
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Event stream lagged, skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let stream =
        ReceiverStream::new(rx).map(|event| Ok(Event::default().json_data(event).unwrap()));

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new().interval(std::time::Duration::from_secs(1)),
    )
}
