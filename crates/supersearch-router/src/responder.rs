//! The responder capability: anything that can produce an answer (or a
//! partial answer) from conversation history.

use async_trait::async_trait;

use supersearch_core::types::{ConversationState, Turn};

use crate::error::ResponderError;
use crate::handoff::HandoffDirective;

/// A component the router can delegate one hop to.
///
/// Implementations must tolerate repeated invocation with growing history,
/// must not mutate the input turn sequence, and should signal "cannot
/// answer" by returning no usable turns rather than by erroring where
/// possible: an error is treated as an execution fault and removes the
/// responder from the rest of the request.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Registered name, used as the handoff target identifier.
    fn name(&self) -> &str;

    /// Human-readable description of what this responder handles, consumed
    /// by routing policies.
    fn capability(&self) -> &str;

    /// Produce zero or more new turns for the conversation, optionally
    /// requesting a transfer of control.
    async fn invoke(&self, state: &ConversationState) -> Result<ResponderReply, ResponderError>;
}

/// What a responder hands back to the router after one hop.
#[derive(Clone, Debug, Default)]
pub struct ResponderReply {
    /// New turns to append to the conversation. May be empty.
    pub turns: Vec<Turn>,
    /// Optional request to transfer control to another responder.
    pub handoff: Option<HandoffDirective>,
}

impl ResponderReply {
    /// A reply with no turns and no handoff ("cannot answer").
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single usable assistant turn tagged with its originating
    /// responder.
    pub fn answer(responder: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant_from(responder, text)],
            handoff: None,
        }
    }

    /// Attach a handoff directive to this reply.
    pub fn with_handoff(mut self, handoff: HandoffDirective) -> Self {
        self.handoff = Some(handoff);
        self
    }

    /// Whether any returned turn can serve as an answer.
    pub fn has_usable_turn(&self) -> bool {
        self.turns.iter().any(|t| t.is_usable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reply() {
        let reply = ResponderReply::empty();
        assert!(reply.turns.is_empty());
        assert!(reply.handoff.is_none());
        assert!(!reply.has_usable_turn());
    }

    #[test]
    fn test_answer_reply_is_usable() {
        let reply = ResponderReply::answer("structured", "5 scholarships found");
        assert_eq!(reply.turns.len(), 1);
        assert!(reply.has_usable_turn());
        assert_eq!(reply.turns[0].responder.as_deref(), Some("structured"));
    }

    #[test]
    fn test_blank_answer_not_usable() {
        let reply = ResponderReply::answer("web", "   ");
        assert!(!reply.has_usable_turn());
    }

    #[test]
    fn test_reply_with_handoff() {
        let reply = ResponderReply::empty()
            .with_handoff(HandoffDirective::to("web").with_reason("needs external data"));
        assert_eq!(reply.handoff.as_ref().unwrap().target, "web");
        assert!(!reply.has_usable_turn());
    }
}
