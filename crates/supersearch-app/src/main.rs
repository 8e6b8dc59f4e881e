//! supersearch application binary - composition root.
//!
//! Ties together all supersearch crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open SQLite storage and seed the knowledge base
//! 3. Build the responders and the supervisor router
//! 4. Start the axum REST API server

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use supersearch_api::{routes, AppState, ChatService};
use supersearch_core::config::AppConfig;
use supersearch_responders::{
    HttpSearchBackend, PredefinedAnswers, StructuredResponder, WebResponder,
};
use supersearch_router::{KeywordPolicy, Router};
use supersearch_storage::{AccountRepository, Database, KnowledgeBase, TranscriptStore};

mod cli;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

/// Build the supervisor router from config: registered responders plus the
/// keyword routing policy.
fn build_router(config: &AppConfig, knowledge: Arc<KnowledgeBase>) -> Router {
    let policy = KeywordPolicy::new(config.structured.enabled);
    let mut router = Router::new(Arc::new(policy), &config.routing);

    if config.structured.enabled {
        router.register(Arc::new(StructuredResponder::new(
            knowledge,
            config.structured.top_k,
        )));
    }

    if config.web.enabled {
        match HttpSearchBackend::new(&config.web) {
            Ok(backend) => {
                router.register(Arc::new(WebResponder::new(
                    backend,
                    config.web.max_results,
                )));
            }
            Err(e) => {
                // No API key: run with an offline backend so the fallback
                // responder still exists.
                tracing::warn!(error = %e, "Web search backend unavailable; using offline backend");
                router.register(Arc::new(WebResponder::new(
                    supersearch_responders::StaticBackend::default(),
                    config.web.max_results,
                )));
            }
        }
    }

    router
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = AppConfig::load_or_default(&config_file);
    config.api.port = args.resolve_port(config.api.port);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.general.log_level.clone())),
        )
        .init();

    tracing::info!("Starting supersearch v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let db_path = data_dir.join("supersearch.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let transcripts = Arc::new(TranscriptStore::new(Arc::clone(&db)));
    let accounts = AccountRepository::new(Arc::clone(&db));
    let knowledge = Arc::new(KnowledgeBase::new(Arc::clone(&db)));
    if knowledge.seed_defaults()? {
        tracing::info!("Knowledge base seeded");
    }

    // Routing engine.
    let router = Arc::new(build_router(&config, knowledge));
    tracing::info!(responders = ?router.responder_names(), "Supervisor router ready");

    // Chat pipeline.
    let chat = ChatService::new(
        Arc::clone(&transcripts),
        Arc::clone(&router),
        Arc::new(PredefinedAnswers::new()),
        config.api.max_message_len,
        config.routing.context_turns,
    );

    // API token.
    let token_path = data_dir.join("api_token");
    let api_token = supersearch_api::auth::load_or_generate_token(&token_path);

    let state = AppState::new(
        config.clone(),
        chat,
        transcripts,
        accounts,
        router,
        api_token,
    );

    // === API server ===

    let addr = format!("127.0.0.1:{}", config.api.port);
    let router = routes::create_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind — is another instance running?");
            tracing::error!(
                "Try: SUPERSEARCH_PORT={} supersearch",
                config.api.port.saturating_add(1)
            );
            return Err(e.into());
        }
    };

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
