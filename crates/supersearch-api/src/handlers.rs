//! Route handler functions for all API endpoints.
//!
//! Each handler extracts parameters via axum extractors, interacts with
//! AppState services, and returns JSON responses.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use supersearch_core::types::SessionSummary;
use supersearch_storage::SignupRequest;

use crate::error::ApiError;
use crate::state::AppState;

/// User id assigned to unauthenticated chat sessions.
const GUEST_USER: &str = "guest";

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<String>,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseBody {
    pub reply: String,
    pub session_id: Uuid,
    /// Which responder produced the reply; absent for predefined answers.
    pub responder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsParams {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct NewSessionRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewSessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
    pub responder: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub turns: Vec<HistoryTurn>,
}

#[derive(Debug, Deserialize)]
pub struct SignupPayload {
    pub institute: String,
    pub studying: String,
    pub username: String,
    pub contact_number: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub ok: bool,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SigninPayload {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SigninResponse {
    pub ok: bool,
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub responders: Vec<String>,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat: answer one user message.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let user_id = req.user_id.as_deref().unwrap_or(GUEST_USER);
    let reply = state
        .chat
        .handle_message(user_id, req.session_id, &req.message)
        .await?;

    Ok(Json(ChatResponseBody {
        reply: reply.answer,
        session_id: reply.session_id,
        responder: reply.responder,
    }))
}

// =============================================================================
// Sessions
// =============================================================================

/// GET /sessions: list a user's sessions, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<SessionsParams>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let user_id = params.user_id.as_deref().unwrap_or(GUEST_USER);
    let sessions = state.transcripts.list_sessions(user_id)?;
    Ok(Json(SessionsResponse { sessions }))
}

/// POST /sessions/new: allocate a fresh session without touching prior
/// transcripts.
pub async fn new_session(
    State(state): State<AppState>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let user_id = req.user_id.as_deref().unwrap_or(GUEST_USER);
    let session_id = state.chat.new_session(user_id)?;
    Ok(Json(NewSessionResponse { session_id }))
}

/// GET /sessions/{id}/history: ordered transcript for a session.
pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state.chat.history(session_id)?;
    Ok(Json(HistoryResponse {
        session_id,
        turns: turns
            .into_iter()
            .map(|t| HistoryTurn {
                role: t.role.as_str().to_string(),
                content: t.content,
                responder: t.responder,
                created_at: t.created_at.timestamp(),
            })
            .collect(),
    }))
}

// =============================================================================
// Accounts
// =============================================================================

/// POST /signup: register a new account.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<Json<SignupResponse>, ApiError> {
    if !payload.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email address".to_string()));
    }
    if payload.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username cannot be empty".to_string()));
    }

    let req = SignupRequest {
        institute: payload.institute,
        studying: payload.studying,
        username: payload.username,
        contact_number: payload.contact_number,
        email: payload.email,
    };

    match state.accounts.signup(&req)? {
        Some(user_id) => Ok(Json(SignupResponse { ok: true, user_id })),
        None => Err(ApiError::Conflict(
            "Email already exists. Please sign in.".to_string(),
        )),
    }
}

/// POST /signin: look up an account by email.
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninPayload>,
) -> Result<Json<SigninResponse>, ApiError> {
    match state.accounts.signin(&payload.email)? {
        Some(account) => Ok(Json(SigninResponse {
            ok: true,
            user_id: account.user_id,
            username: account.username,
        })),
        None => Err(ApiError::NotFound(
            "Email not found. Please sign up.".to_string(),
        )),
    }
}

// =============================================================================
// Health
// =============================================================================

/// GET /health: liveness and registered responders.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        responders: state
            .router
            .responder_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect(),
    })
}
