//! Chat pipeline: the presentation-facing service that ties transcripts,
//! predefined answers, and the routing engine together for one message.

use std::sync::Arc;

use uuid::Uuid;

use supersearch_core::types::Turn;
use supersearch_responders::PredefinedAnswers;
use supersearch_router::Router;
use supersearch_storage::TranscriptStore;

/// Errors from the chat pipeline.
///
/// Routing failures are absent by design: the router always yields an
/// answer. Only input validation and storage problems surface here.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<supersearch_core::error::SearchError> for ChatError {
    fn from(err: supersearch_core::error::SearchError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

/// The reply handed back to the presentation layer.
#[derive(Clone, Debug)]
pub struct ChatReply {
    /// Session the exchange was recorded under (new or existing).
    pub session_id: Uuid,
    /// The answer text. Never empty.
    pub answer: String,
    /// Responder that produced the answer, when one did.
    pub responder: Option<String>,
}

/// Handles one chat message end to end.
pub struct ChatService {
    transcripts: Arc<TranscriptStore>,
    router: Arc<Router>,
    canned: Arc<PredefinedAnswers>,
    max_message_len: usize,
    context_turns: usize,
}

impl ChatService {
    pub fn new(
        transcripts: Arc<TranscriptStore>,
        router: Arc<Router>,
        canned: Arc<PredefinedAnswers>,
        max_message_len: usize,
        context_turns: usize,
    ) -> Self {
        Self {
            transcripts,
            router,
            canned,
            max_message_len,
            context_turns,
        }
    }

    /// Process one user message and return the terminal answer.
    ///
    /// Loads or creates the session, short-circuits through the predefined
    /// answers, otherwise appends the user turn, windows the conversation
    /// for the router, runs the routing loop, and persists every turn the
    /// loop produced. Transient routing metadata is never persisted.
    pub async fn handle_message(
        &self,
        user_id: &str,
        session_id: Option<Uuid>,
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.max_message_len {
            return Err(ChatError::MessageTooLong(self.max_message_len));
        }

        let sid = match session_id {
            Some(sid) => sid,
            None => self.transcripts.create_session(user_id)?,
        };
        let mut state = self.transcripts.get_or_create(user_id, sid)?;

        // Quick answers skip the routing loop entirely.
        if let Some(answer) = self.canned.lookup(message) {
            self.transcripts.append_user_turn(sid, message)?;
            self.transcripts.append_assistant_turn(sid, answer)?;
            tracing::debug!(session = %sid, "Answered from predefined set");
            return Ok(ChatReply {
                session_id: sid,
                answer: answer.to_string(),
                responder: None,
            });
        }

        let user_turn = self.transcripts.append_user_turn(sid, message)?;
        state.push_turn(user_turn);

        // The router sees a bounded window of recent history, like the
        // rest of the transcript it is append-only.
        let mut windowed = state.recent_window(self.context_turns);
        let outcome = self.router.run(&mut windowed).await;

        for turn in &outcome.new_turns {
            self.transcripts.append_turn(sid, turn)?;
        }

        tracing::info!(
            session = %sid,
            responder = outcome.answer.responder.as_deref().unwrap_or("fallback"),
            events = outcome.events.len(),
            fault = outcome.fault.map(|f| f.as_str()).unwrap_or("none"),
            "Chat message answered"
        );

        Ok(ChatReply {
            session_id: sid,
            answer: outcome.answer.content.clone(),
            responder: outcome.answer.responder.clone(),
        })
    }

    /// Allocate a fresh session, leaving prior transcripts untouched.
    pub fn new_session(&self, user_id: &str) -> Result<Uuid, ChatError> {
        Ok(self.transcripts.create_session(user_id)?)
    }

    /// Ordered transcript for a session.
    pub fn history(&self, session_id: Uuid) -> Result<Vec<Turn>, ChatError> {
        Ok(self.transcripts.history(session_id)?)
    }
}

// =============================================================================
// Tests
// =============================================================================
