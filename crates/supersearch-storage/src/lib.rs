//! SQLite persistence for supersearch.
//!
//! Provides the transcript store (sessions and turns), user accounts,
//! and the structured knowledge base the structured responder queries.

pub mod db;
pub mod knowledge;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use knowledge::{KnowledgeBase, KnowledgeRow};
pub use repository::{Account, AccountRepository, SignupRequest, TranscriptStore};
