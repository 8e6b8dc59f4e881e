//! Structured knowledge-base responder.
//!
//! Answers scholarship and university questions from the local tables.
//! When the tables have nothing to offer it signals "needs external data"
//! by handing off to the web responder instead of answering.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use supersearch_core::types::ConversationState;
use supersearch_router::{HandoffDirective, Responder, ResponderError, ResponderReply};
use supersearch_storage::{KnowledgeBase, KnowledgeRow};

/// Words too common to narrow a table lookup.
static STOP_WORDS: &[&str] = &[
    "the", "a", "an", "of", "for", "in", "on", "at", "to", "and", "or", "is", "are", "what",
    "which", "who", "how", "do", "does", "can", "could", "me", "my", "i", "you", "about", "any",
    "there", "with", "available", "tell", "show", "list", "give", "please",
];

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z']+").expect("invalid word regex"));

/// Responder backed by the scholarships/universities tables.
pub struct StructuredResponder {
    knowledge: Arc<KnowledgeBase>,
    top_k: usize,
}

impl StructuredResponder {
    pub fn new(knowledge: Arc<KnowledgeBase>, top_k: usize) -> Self {
        Self { knowledge, top_k }
    }

    /// Extract lookup keywords from a question: lowercase words with the
    /// stop words removed.
    fn keywords(question: &str) -> Vec<String> {
        let mut words: Vec<String> = WORD
            .find_iter(question)
            .map(|m| m.as_str().to_lowercase())
            .filter(|w| !STOP_WORDS.contains(&w.as_str()))
            .collect();
        words.dedup();
        words
    }

    /// Render matched rows into one readable answer.
    fn format_rows(rows: &[KnowledgeRow]) -> String {
        let mut out = String::new();
        let scholarships: Vec<&KnowledgeRow> =
            rows.iter().filter(|r| r.table == "scholarships").collect();
        let universities: Vec<&KnowledgeRow> =
            rows.iter().filter(|r| r.table == "universities").collect();

        if !scholarships.is_empty() {
            out.push_str("Here's what I found in the scholarship records:\n");
            for (i, row) in scholarships.iter().enumerate() {
                out.push_str(&format!(
                    "{}. {} - {}. {} More info: {}\n",
                    i + 1,
                    row.name,
                    row.detail,
                    row.extra,
                    row.link
                ));
            }
        }
        if !universities.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Matching universities:\n");
            for (i, row) in universities.iter().enumerate() {
                out.push_str(&format!(
                    "{}. {} - {}. {} Website: {}\n",
                    i + 1,
                    row.name,
                    row.detail,
                    row.extra,
                    row.link
                ));
            }
        }
        out
    }
}

#[async_trait]
impl Responder for StructuredResponder {
    fn name(&self) -> &str {
        "structured"
    }

    fn capability(&self) -> &str {
        "Answers questions from the scholarships and universities tables"
    }

    async fn invoke(&self, state: &ConversationState) -> Result<ResponderReply, ResponderError> {
        let question = match state.latest_user_turn() {
            Some(turn) => turn.content.clone(),
            None => return Ok(ResponderReply::empty()),
        };

        let keywords = Self::keywords(&question);
        tracing::debug!(keywords = ?keywords, "Structured lookup");

        let mut rows = self.knowledge.search_scholarships(&keywords, self.top_k)?;
        let remaining = self.top_k.saturating_sub(rows.len());
        if remaining > 0 {
            rows.extend(self.knowledge.search_universities(&keywords, remaining)?);
        }

        if rows.is_empty() {
            // Out of data: escalate to the open web rather than answering.
            tracing::debug!("No knowledge rows matched; requesting web handoff");
            return Ok(ResponderReply::empty()
                .with_handoff(HandoffDirective::to("web").with_reason("needs external data")));
        }

        Ok(ResponderReply::answer(self.name(), Self::format_rows(&rows)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use supersearch_storage::Database;
    use uuid::Uuid;

    fn make_responder() -> StructuredResponder {
        let kb = KnowledgeBase::new(Arc::new(Database::in_memory().unwrap()));
        kb.seed_defaults().unwrap();
        StructuredResponder::new(Arc::new(kb), 5)
    }

    fn question(text: &str) -> ConversationState {
        let mut state = ConversationState::new(Uuid::new_v4(), "guest");
        state.push_turn(supersearch_core::types::Turn::user(text));
        state
    }

    // ---- Keyword extraction ----

    #[test]
    fn test_keywords_drop_stop_words() {
        let kw = StructuredResponder::keywords("What scholarships are available for CS students?");
        assert!(kw.contains(&"scholarships".to_string()));
        assert!(kw.contains(&"students".to_string()));
        assert!(!kw.contains(&"what".to_string()));
        assert!(!kw.contains(&"available".to_string()));
    }

    #[test]
    fn test_keywords_lowercase() {
        let kw = StructuredResponder::keywords("PETRONAS Scholarship");
        assert!(kw.contains(&"petronas".to_string()));
        assert!(kw.contains(&"scholarship".to_string()));
    }

    // ---- Answering ----

    #[tokio::test]
    async fn test_answers_scholarship_question() {
        let responder = make_responder();
        let state = question("What scholarships are there for computer science?");
        let reply = responder.invoke(&state).await.unwrap();

        assert!(reply.has_usable_turn());
        assert!(reply.handoff.is_none());
        let content = &reply.turns[0].content;
        assert!(content.contains("scholarship records"));
        assert!(content.contains("More info: https://"));
    }

    #[tokio::test]
    async fn test_answers_university_question() {
        let responder = make_responder();
        let state = question("Tell me about universities in Penang");
        let reply = responder.invoke(&state).await.unwrap();

        assert!(reply.has_usable_turn());
        assert!(reply.turns[0].content.contains("Universiti Sains Malaysia"));
    }

    #[tokio::test]
    async fn test_answer_tagged_with_responder_name() {
        let responder = make_responder();
        let state = question("scholarships for engineering?");
        let reply = responder.invoke(&state).await.unwrap();
        assert_eq!(reply.turns[0].responder.as_deref(), Some("structured"));
    }

    #[tokio::test]
    async fn test_respects_top_k() {
        let kb = KnowledgeBase::new(Arc::new(Database::in_memory().unwrap()));
        kb.seed_defaults().unwrap();
        let responder = StructuredResponder::new(Arc::new(kb), 2);
        let state = question("List every scholarship in malaysia");
        let reply = responder.invoke(&state).await.unwrap();

        let content = &reply.turns[0].content;
        // Two numbered entries at most.
        assert!(content.contains("1. "));
        assert!(content.contains("2. "));
        assert!(!content.contains("3. "));
    }

    // ---- Out of data ----

    #[tokio::test]
    async fn test_no_rows_hands_off_to_web() {
        let responder = make_responder();
        let state = question("zorbulon frequencies?");
        let reply = responder.invoke(&state).await.unwrap();

        assert!(!reply.has_usable_turn());
        let handoff = reply.handoff.expect("expected a web handoff");
        assert_eq!(handoff.target, "web");
        assert_eq!(handoff.reason.as_deref(), Some("needs external data"));
    }

    #[tokio::test]
    async fn test_empty_knowledge_base_hands_off() {
        let kb = KnowledgeBase::new(Arc::new(Database::in_memory().unwrap()));
        let responder = StructuredResponder::new(Arc::new(kb), 5);
        let state = question("What scholarships are available?");
        let reply = responder.invoke(&state).await.unwrap();
        assert!(reply.handoff.is_some());
    }

    #[tokio::test]
    async fn test_no_user_turn_returns_empty() {
        let responder = make_responder();
        let state = ConversationState::new(Uuid::new_v4(), "guest");
        let reply = responder.invoke(&state).await.unwrap();
        assert!(reply.turns.is_empty());
        assert!(reply.handoff.is_none());
    }
}
