//! Database schema migrations.
//!
//! Applies the initial schema: accounts, sessions, turns, and the two
//! knowledge tables (scholarships, universities) the structured responder
//! reads from.

use rusqlite::Connection;
use tracing::info;

use supersearch_core::error::SearchError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), SearchError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SearchError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| SearchError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), SearchError> {
    conn.execute_batch(
        "
        -- Registered users.
        CREATE TABLE IF NOT EXISTS accounts (
            user_id         INTEGER PRIMARY KEY AUTOINCREMENT,
            institute       TEXT NOT NULL,
            studying        TEXT NOT NULL,
            username        TEXT NOT NULL,
            contact_number  TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        -- Conversation sessions. Starting a new session allocates a fresh
        -- row; prior sessions are never deleted by the chat flow.
        CREATE TABLE IF NOT EXISTS sessions (
            id              TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            title           TEXT NOT NULL DEFAULT '',
            started_at      INTEGER NOT NULL,
            last_message_at INTEGER NOT NULL,
            turn_count      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user
            ON sessions (user_id, last_message_at DESC);

        -- Ordered transcript turns. seq is assigned by the store and is
        -- contiguous per session.
        CREATE TABLE IF NOT EXISTS turns (
            id              TEXT PRIMARY KEY NOT NULL,
            session_id      TEXT NOT NULL,
            seq             INTEGER NOT NULL,
            role            TEXT NOT NULL
                            CHECK (role IN ('user', 'assistant', 'system')),
            content         TEXT NOT NULL DEFAULT '',
            responder       TEXT,
            created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            UNIQUE (session_id, seq),
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_turns_session
            ON turns (session_id, seq ASC);

        -- Knowledge base: scholarships.
        CREATE TABLE IF NOT EXISTS scholarships (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            provider        TEXT NOT NULL,
            field_of_study  TEXT NOT NULL DEFAULT '',
            amount          TEXT NOT NULL DEFAULT '',
            eligibility     TEXT NOT NULL DEFAULT '',
            link            TEXT NOT NULL DEFAULT '',
            relevance       INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_scholarships_relevance
            ON scholarships (relevance DESC);

        -- Knowledge base: universities.
        CREATE TABLE IF NOT EXISTS universities (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            location        TEXT NOT NULL DEFAULT '',
            programs        TEXT NOT NULL DEFAULT '',
            website         TEXT NOT NULL DEFAULT '',
            about           TEXT NOT NULL DEFAULT '',
            contact         TEXT NOT NULL DEFAULT '',
            relevance       INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_universities_relevance
            ON universities (relevance DESC);

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| SearchError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
