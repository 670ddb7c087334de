//! HTTP transport for the command surface

use crate::api::dispatcher::CommandDispatcher;
use crate::api::errors::{Response, RpcError};
use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// A command request
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

/// The response envelope, echoing the request id when one was sent
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    #[serde(flatten)]
    pub response: Response,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub id: Value,
}

/// Health check
async fn health_check() -> &'static str {
    "OK"
}

async fn handle_command(
    State(dispatcher): State<Arc<CommandDispatcher>>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResponse> {
    let CommandRequest { method, params, id } = request;
    // Handlers take blocking locks on the chain and the template cache
    let response = tokio::task::spawn_blocking(move || dispatcher.dispatch_value(&method, params))
        .await
        .unwrap_or_else(|e| Response::failure(RpcError::internal(e.to_string())));
    Json(CommandResponse { response, id })
}

/// Create the router serving commands on `POST /`
pub fn create_router(dispatcher: Arc<CommandDispatcher>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", post(handle_command))
        .route("/health", get(health_check))
        .with_state(dispatcher)
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::tests::test_state;
    use crate::ledger::Ledger;
    use serde_json::json;

    #[tokio::test]
    async fn test_command_round_trip() {
        let (_, state) = test_state();
        let dispatcher = Arc::new(CommandDispatcher::new(state));

        let request: CommandRequest =
            serde_json::from_value(json!({"method": "getblockheight", "id": 7})).unwrap();
        let Json(response) = handle_command(State(dispatcher.clone()), Json(request)).await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Result": 0, "Error": 0, "id": 7})
        );

        let request: CommandRequest =
            serde_json::from_value(json!({"method": "nosuch", "params": {}})).unwrap();
        let Json(response) = handle_command(State(dispatcher), Json(request)).await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Result": "Invalid method", "Error": 42001})
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_commands() {
        let (chain, state) = test_state();
        let dispatcher = Arc::new(CommandDispatcher::new(state));

        let mut calls = vec![json!({"method": "discretemining", "params": {"count": 3}})];
        calls.extend((0..8).map(|_| json!({"method": "getblockheight"})));
        let tasks: Vec<_> = calls
            .into_iter()
            .map(|call| {
                let request: CommandRequest = serde_json::from_value(call).unwrap();
                tokio::spawn(handle_command(State(dispatcher.clone()), Json(request)))
            })
            .collect();
        for task in tasks {
            let Json(response) = task.await.unwrap();
            assert!(response.response.is_success());
        }
        assert_eq!(chain.best_height(), 3);
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health_check().await, "OK");
    }
}
