//! Repository implementations for SQLite-backed persistence.
//!
//! Provides the TranscriptStore (sessions and ordered turns) and the
//! AccountRepository (signup/signin) that operate on the Database struct
//! using raw SQL.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use supersearch_core::error::SearchError;
use supersearch_core::types::{ConversationState, Role, SessionSummary, Turn};

use crate::db::Database;

/// Maximum characters of the first user turn used as a session title.
const TITLE_MAX_LEN: usize = 60;

// =============================================================================
// TranscriptStore
// =============================================================================

/// Persists conversation transcripts: one session row plus an ordered,
/// append-only sequence of turns per session.
///
/// Only turns are persisted. The routing metadata on a
/// [`ConversationState`] (`depth`, `done`, `pending_route`, `fault`) is
/// transient and never written here.
pub struct TranscriptStore {
    db: Arc<Database>,
}

impl TranscriptStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Load an existing session's conversation, or create a fresh session
    /// owned by `user_id` when the id is unknown.
    ///
    /// The returned state carries the full ordered turn history and clean
    /// routing metadata.
    pub fn get_or_create(
        &self,
        user_id: &str,
        session_id: Uuid,
    ) -> Result<ConversationState, SearchError> {
        self.db.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT user_id FROM sessions WHERE id = ?1",
                    rusqlite::params![session_id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            let owner = match existing {
                Some(owner) => owner,
                None => {
                    let now = Utc::now().timestamp();
                    conn.execute(
                        "INSERT INTO sessions (id, user_id, title, started_at, last_message_at)
                         VALUES (?1, ?2, '', ?3, ?3)",
                        rusqlite::params![session_id.to_string(), user_id, now],
                    )
                    .map_err(|e| {
                        SearchError::Storage(format!("Failed to create session: {}", e))
                    })?;
                    user_id.to_string()
                }
            };

            let mut state = ConversationState::new(session_id, owner);
            state.turns = load_turns(conn, session_id)?;
            Ok(state)
        })
    }

    /// Allocate a brand-new session for a user.
    ///
    /// Prior sessions are left untouched; "new chat" never deletes
    /// history.
    pub fn create_session(&self, user_id: &str) -> Result<Uuid, SearchError> {
        let session_id = Uuid::new_v4();
        self.db.with_conn(|conn| {
            let now = Utc::now().timestamp();
            conn.execute(
                "INSERT INTO sessions (id, user_id, title, started_at, last_message_at)
                 VALUES (?1, ?2, '', ?3, ?3)",
                rusqlite::params![session_id.to_string(), user_id, now],
            )
            .map_err(|e| SearchError::Storage(format!("Failed to create session: {}", e)))?;
            Ok(())
        })?;
        Ok(session_id)
    }

    /// Append one turn to a session's transcript.
    ///
    /// Assigns the next sequence number, bumps the session's activity
    /// timestamp and turn count, and sets the session title from the first
    /// user turn. Appends to the same session are serialized by the
    /// connection lock.
    pub fn append_turn(&self, session_id: Uuid, turn: &Turn) -> Result<(), SearchError> {
        self.db.with_conn(|conn| {
            let next_seq: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(seq) + 1, 0) FROM turns WHERE session_id = ?1",
                    rusqlite::params![session_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            conn.execute(
                "INSERT INTO turns (id, session_id, seq, role, content, responder, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    turn.id.to_string(),
                    session_id.to_string(),
                    next_seq,
                    turn.role.as_str(),
                    turn.content,
                    turn.responder,
                    turn.created_at.timestamp(),
                ],
            )
            .map_err(|e| SearchError::Storage(format!("Failed to append turn: {}", e)))?;

            conn.execute(
                "UPDATE sessions SET last_message_at = ?1, turn_count = turn_count + 1
                 WHERE id = ?2",
                rusqlite::params![Utc::now().timestamp(), session_id.to_string()],
            )
            .map_err(|e| SearchError::Storage(e.to_string()))?;

            // First user turn titles the session.
            if turn.role == Role::User {
                conn.execute(
                    "UPDATE sessions SET title = ?1 WHERE id = ?2 AND title = ''",
                    rusqlite::params![truncate_title(&turn.content), session_id.to_string()],
                )
                .map_err(|e| SearchError::Storage(e.to_string()))?;
            }

            Ok(())
        })
    }

    /// Convenience: append a user turn built from raw text.
    pub fn append_user_turn(&self, session_id: Uuid, text: &str) -> Result<Turn, SearchError> {
        let turn = Turn::user(text);
        self.append_turn(session_id, &turn)?;
        Ok(turn)
    }

    /// Convenience: append an assistant turn built from raw text.
    pub fn append_assistant_turn(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> Result<Turn, SearchError> {
        let turn = Turn::assistant(text);
        self.append_turn(session_id, &turn)?;
        Ok(turn)
    }

    /// Ordered transcript for a session. Returns an error for unknown
    /// sessions.
    pub fn history(&self, session_id: Uuid) -> Result<Vec<Turn>, SearchError> {
        self.db.with_conn(|conn| {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM sessions WHERE id = ?1",
                    rusqlite::params![session_id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| SearchError::Storage(e.to_string()))?;
            if exists.is_none() {
                return Err(SearchError::Storage(format!(
                    "session not found: {}",
                    session_id
                )));
            }
            load_turns(conn, session_id)
        })
    }

    /// List a user's sessions, most recently active first.
    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, SearchError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, started_at, last_message_at, turn_count
                     FROM sessions
                     WHERE user_id = ?1
                     ORDER BY last_message_at DESC",
                )
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id], |row| {
                    let id: String = row.get(0)?;
                    Ok((
                        id,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            let mut sessions = Vec::new();
            for row in rows {
                let (id, title, started_at, last_message_at, turn_count) =
                    row.map_err(|e| SearchError::Storage(e.to_string()))?;
                let session_id = Uuid::parse_str(&id)
                    .map_err(|e| SearchError::Storage(format!("Corrupt session id: {}", e)))?;
                sessions.push(SessionSummary {
                    session_id,
                    title,
                    started_at,
                    last_message_at,
                    turn_count: turn_count as u32,
                });
            }
            Ok(sessions)
        })
    }
}

/// Load the ordered turn sequence for a session.
fn load_turns(conn: &rusqlite::Connection, session_id: Uuid) -> Result<Vec<Turn>, SearchError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, role, content, responder, created_at
             FROM turns WHERE session_id = ?1
             ORDER BY seq ASC",
        )
        .map_err(|e| SearchError::Storage(e.to_string()))?;

    let rows = stmt
        .query_map(rusqlite::params![session_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .map_err(|e| SearchError::Storage(e.to_string()))?;

    let mut turns = Vec::new();
    for row in rows {
        let (id, role, content, responder, created_at) =
            row.map_err(|e| SearchError::Storage(e.to_string()))?;
        let role = Role::parse(&role)
            .ok_or_else(|| SearchError::Storage(format!("Corrupt turn role: {}", role)))?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| SearchError::Storage(format!("Corrupt turn id: {}", e)))?;
        let created_at = chrono::DateTime::from_timestamp(created_at, 0)
            .ok_or_else(|| SearchError::Storage("Corrupt turn timestamp".to_string()))?;
        turns.push(Turn {
            id,
            role,
            content,
            responder,
            created_at,
        });
    }
    Ok(turns)
}

/// Truncate a user message to a session title, on a char boundary.
fn truncate_title(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= TITLE_MAX_LEN {
        return trimmed.to_string();
    }
    let truncated: String = trimmed.chars().take(TITLE_MAX_LEN).collect();
    format!("{}…", truncated)
}

// =============================================================================
// AccountRepository
// =============================================================================

/// A registered user account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// Signup payload.
#[derive(Clone, Debug)]
pub struct SignupRequest {
    pub institute: String,
    pub studying: String,
    pub username: String,
    pub contact_number: String,
    pub email: String,
}

/// Repository for user accounts.
pub struct AccountRepository {
    db: Arc<Database>,
}

impl AccountRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new account.
    ///
    /// Returns `Ok(None)` when the email is already registered (the caller
    /// maps this to a conflict), `Ok(Some(user_id))` on success.
    pub fn signup(&self, req: &SignupRequest) -> Result<Option<i64>, SearchError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "INSERT INTO accounts (institute, studying, username, contact_number, email)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (email) DO NOTHING",
                    rusqlite::params![
                        req.institute,
                        req.studying,
                        req.username,
                        req.contact_number,
                        req.email,
                    ],
                )
                .map_err(|e| SearchError::Storage(format!("Failed to sign up: {}", e)))?;

            if changed == 0 {
                return Ok(None);
            }
            Ok(Some(conn.last_insert_rowid()))
        })
    }

    /// Look up an account by email.
    pub fn signin(&self, email: &str) -> Result<Option<Account>, SearchError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, username, email FROM accounts WHERE email = ?1",
                rusqlite::params![email],
                |row| {
                    Ok(Account {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|e| SearchError::Storage(e.to_string()))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> TranscriptStore {
        TranscriptStore::new(Arc::new(Database::in_memory().unwrap()))
    }

    // ---- get_or_create ----

    #[test]
    fn test_get_or_create_new_session() {
        let store = make_store();
        let sid = Uuid::new_v4();
        let state = store.get_or_create("guest", sid).unwrap();
        assert_eq!(state.session_id, sid);
        assert_eq!(state.user_id, "guest");
        assert!(state.turns.is_empty());
        assert_eq!(state.depth, 0);
    }

    #[test]
    fn test_get_or_create_existing_keeps_owner() {
        let store = make_store();
        let sid = Uuid::new_v4();
        store.get_or_create("alice", sid).unwrap();
        // A second caller with a different user id does not steal the session.
        let state = store.get_or_create("bob", sid).unwrap();
        assert_eq!(state.user_id, "alice");
    }

    #[test]
    fn test_get_or_create_loads_history_in_order() {
        let store = make_store();
        let sid = Uuid::new_v4();
        store.get_or_create("guest", sid).unwrap();
        store.append_user_turn(sid, "first").unwrap();
        store.append_assistant_turn(sid, "reply one").unwrap();
        store.append_user_turn(sid, "second").unwrap();

        let state = store.get_or_create("guest", sid).unwrap();
        assert_eq!(state.turns.len(), 3);
        assert_eq!(state.turns[0].content, "first");
        assert_eq!(state.turns[0].role, Role::User);
        assert_eq!(state.turns[1].content, "reply one");
        assert_eq!(state.turns[1].role, Role::Assistant);
        assert_eq!(state.turns[2].content, "second");
    }

    // ---- append ----

    #[test]
    fn test_append_preserves_responder_tag() {
        let store = make_store();
        let sid = Uuid::new_v4();
        store.get_or_create("guest", sid).unwrap();
        let turn = Turn::assistant_from("web", "found it");
        store.append_turn(sid, &turn).unwrap();

        let history = store.history(sid).unwrap();
        assert_eq!(history[0].responder.as_deref(), Some("web"));
    }

    #[test]
    fn test_append_assigns_contiguous_seq() {
        let store = make_store();
        let sid = Uuid::new_v4();
        store.get_or_create("guest", sid).unwrap();
        for i in 0..5 {
            store.append_user_turn(sid, &format!("msg {}", i)).unwrap();
        }
        let history = store.history(sid).unwrap();
        assert_eq!(history.len(), 5);
        for (i, turn) in history.iter().enumerate() {
            assert_eq!(turn.content, format!("msg {}", i));
        }
    }

    #[test]
    fn test_first_user_turn_titles_session() {
        let store = make_store();
        let sid = Uuid::new_v4();
        store.get_or_create("guest", sid).unwrap();
        store
            .append_user_turn(sid, "What scholarships are available?")
            .unwrap();
        store.append_user_turn(sid, "And universities?").unwrap();

        let sessions = store.list_sessions("guest").unwrap();
        assert_eq!(sessions[0].title, "What scholarships are available?");
    }

    #[test]
    fn test_long_title_truncated() {
        let store = make_store();
        let sid = Uuid::new_v4();
        store.get_or_create("guest", sid).unwrap();
        let long = "x".repeat(200);
        store.append_user_turn(sid, &long).unwrap();

        let sessions = store.list_sessions("guest").unwrap();
        assert!(sessions[0].title.chars().count() <= TITLE_MAX_LEN + 1);
        assert!(sessions[0].title.ends_with('…'));
    }

    #[test]
    fn test_empty_content_turn_roundtrips() {
        // An empty content string is a valid, persistable value.
        let store = make_store();
        let sid = Uuid::new_v4();
        store.get_or_create("guest", sid).unwrap();
        store.append_turn(sid, &Turn::assistant("")).unwrap();

        let history = store.history(sid).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "");
        assert!(!history[0].is_usable());
    }

    // ---- history ----

    #[test]
    fn test_history_unknown_session_errors() {
        let store = make_store();
        let result = store.history(Uuid::new_v4());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("session not found"));
    }

    // ---- list_sessions ----

    #[test]
    fn test_list_sessions_empty() {
        let store = make_store();
        assert!(store.list_sessions("guest").unwrap().is_empty());
    }

    #[test]
    fn test_list_sessions_scoped_to_user() {
        let store = make_store();
        let s1 = store.create_session("alice").unwrap();
        store.create_session("bob").unwrap();

        let sessions = store.list_sessions("alice").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, s1);
    }

    #[test]
    fn test_list_sessions_counts_turns() {
        let store = make_store();
        let sid = store.create_session("guest").unwrap();
        store.append_user_turn(sid, "hello").unwrap();
        store.append_assistant_turn(sid, "hi there").unwrap();

        let sessions = store.list_sessions("guest").unwrap();
        assert_eq!(sessions[0].turn_count, 2);
    }

    #[test]
    fn test_new_session_preserves_old_transcripts() {
        let store = make_store();
        let first = store.create_session("guest").unwrap();
        store.append_user_turn(first, "old question").unwrap();

        let second = store.create_session("guest").unwrap();
        assert_ne!(first, second);

        // Old transcript still intact.
        let history = store.history(first).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(store.list_sessions("guest").unwrap().len(), 2);
    }

    // ---- accounts ----

    fn make_accounts() -> AccountRepository {
        AccountRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn signup_req(email: &str) -> SignupRequest {
        SignupRequest {
            institute: "UM".to_string(),
            studying: "Computer Science".to_string(),
            username: "ali".to_string(),
            contact_number: "0123456789".to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_signup_and_signin() {
        let repo = make_accounts();
        let user_id = repo.signup(&signup_req("ali@example.com")).unwrap().unwrap();
        assert!(user_id > 0);

        let account = repo.signin("ali@example.com").unwrap().unwrap();
        assert_eq!(account.user_id, user_id);
        assert_eq!(account.username, "ali");
    }

    #[test]
    fn test_signup_duplicate_email() {
        let repo = make_accounts();
        repo.signup(&signup_req("ali@example.com")).unwrap();
        let second = repo.signup(&signup_req("ali@example.com")).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_signin_unknown_email() {
        let repo = make_accounts();
        assert!(repo.signin("nobody@example.com").unwrap().is_none());
    }

    // ---- title helper ----

    #[test]
    fn test_truncate_title_short_unchanged() {
        assert_eq!(truncate_title("  hello  "), "hello");
    }

    #[test]
    fn test_truncate_title_unicode_boundary() {
        let s = "é".repeat(100);
        let title = truncate_title(&s);
        assert_eq!(title.chars().count(), TITLE_MAX_LEN + 1);
    }
}
