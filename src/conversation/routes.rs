//! HTTP endpoint for conversation turns.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use super::model::ConversationBody;
use super::orchestrator::ConversationOrchestrator;
use crate::error::{Error, ValidationError};

/// Shared state for conversation routes.
#[derive(Clone)]
pub struct ConversationRouteState {
    pub orchestrator: Arc<ConversationOrchestrator>,
}

#[derive(Debug, Deserialize)]
struct PromptQuery {
    prompt: Option<String>,
}

/// GET /api/ai?prompt=...
///
/// Quick manual testing from a browser; always a chat turn.
async fn converse_query(
    State(state): State<ConversationRouteState>,
    Query(query): Query<PromptQuery>,
) -> Result<Json<Value>, Error> {
    let body = ConversationBody {
        prompt: query.prompt,
        ..ConversationBody::default()
    };
    run_turn(&state, body).await
}

/// POST /api/ai
async fn converse(
    State(state): State<ConversationRouteState>,
    body: Bytes,
) -> Result<Json<Value>, Error> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        ConversationBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ValidationError::MalformedBody(e.to_string()))?
    };
    run_turn(&state, body).await
}

async fn run_turn(state: &ConversationRouteState, body: ConversationBody) -> Result<Json<Value>, Error> {
    let request = body.validate()?;
    let reply = state.orchestrator.respond(request).await?;
    Ok(Json(json!({ "reply": reply })))
}

/// Build the conversation routes.
pub fn conversation_routes(state: ConversationRouteState) -> Router {
    Router::new()
        .route("/api/ai", get(converse_query).post(converse))
        .with_state(state)
}
