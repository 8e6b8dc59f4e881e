//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use supersearch_core::config::AppConfig;
use supersearch_router::Router;
use supersearch_storage::{AccountRepository, TranscriptStore};

use crate::chat::ChatService;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (not mutated at runtime).
    pub config: Arc<AppConfig>,
    /// The chat pipeline (transcripts + predefined answers + router).
    pub chat: Arc<ChatService>,
    /// Transcript store, for session listing.
    pub transcripts: Arc<TranscriptStore>,
    /// Account repository for signup/signin.
    pub accounts: Arc<AccountRepository>,
    /// The routing engine, for health reporting.
    pub router: Arc<Router>,
    /// Bearer token protecting the chat and session routes.
    pub api_token: String,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with the given components.
    pub fn new(
        config: AppConfig,
        chat: ChatService,
        transcripts: Arc<TranscriptStore>,
        accounts: AccountRepository,
        router: Arc<Router>,
        api_token: String,
    ) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            transcripts,
            accounts: Arc::new(accounts),
            router,
            api_token,
            start_time: Instant::now(),
        }
    }
}
