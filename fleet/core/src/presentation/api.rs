// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::ack_service::AckService;
use crate::application::cancellable;
use crate::domain::ack::{AckError, AckResponse};
use crate::domain::agent::{Agent, AgentId};
use crate::domain::repository::{AgentRepository, RepositoryError};

pub struct AppState {
    pub agents: Arc<dyn AgentRepository>,
    pub ack_service: Arc<dyn AckService>,
    /// Cancelled on server shutdown; every request works on a child token.
    pub shutdown: CancellationToken,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/fleet/agents/{id}/acks", post(handle_acks))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn handle_acks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let token = state.shutdown.child_token();
    // Cancels in-flight store calls if the client goes away and this future is dropped.
    let _guard = token.clone().drop_guard();

    match process_acks(&state, &token, AgentId::new(id.as_str()), &body).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            let code = StatusCode::BAD_REQUEST;
            // Don't log connection drops
            if !err.is_cancelled() {
                metrics::counter!("fleet_ack_failures_total").increment(1);
                error!(agent_id = %id, code = code.as_u16(), error = %err, "Fail ACK");
            }
            (code, err.to_string()).into_response()
        }
    }
}

async fn process_acks(
    state: &AppState,
    token: &CancellationToken,
    agent_id: AgentId,
    body: &[u8],
) -> Result<AckResponse, AckError> {
    let agent = load_agent(state, token, agent_id).await?;
    state.ack_service.handle_acks(token, &agent, body).await
}

async fn load_agent(state: &AppState, token: &CancellationToken, agent_id: AgentId) -> Result<Agent, AckError> {
    let agent = match cancellable(token, state.agents.find_by_id(&agent_id)).await {
        Ok(agent) => agent,
        Err(RepositoryError::NotFound(_)) => return Err(AckError::AgentNotFound(agent_id)),
        Err(e) => return Err(e.into()),
    };

    if !agent.active {
        return Err(AckError::AgentInactive(agent.id));
    }
    Ok(agent)
}
