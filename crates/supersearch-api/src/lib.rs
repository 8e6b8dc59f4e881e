//! supersearch API crate - axum HTTP server and route handlers.
//!
//! Provides the REST surface: chat, session management, account
//! signup/signin, and health checks. Responder failures never surface
//! here; the router fallback guarantees every chat request a reply.

pub mod auth;
pub mod chat;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use chat::{ChatError, ChatReply, ChatService};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
