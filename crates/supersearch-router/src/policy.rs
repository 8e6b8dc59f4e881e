//! Routing policies: classification of "what should happen next".
//!
//! The decision of which responder handles a query is a pluggable policy
//! behind a narrow trait: rule-backed by default, swappable for a
//! model-backed classifier without touching the router.

use std::sync::LazyLock;

use regex::Regex;

use supersearch_core::types::{ConversationState, RouteTarget};

/// Outcome of one classification step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// The conversation already holds a terminal answer; stop the loop.
    Stop,
    /// Transfer control to the named responder for one hop.
    Delegate(RouteTarget),
}

/// Classifies the conversation into {already-answered, structured-domain
/// query, open/general query}.
pub trait RoutingPolicy: Send + Sync {
    fn classify(&self, state: &ConversationState) -> RouteDecision;
}

// =============================================================================
// KeywordPolicy
// =============================================================================

/// Vocabulary that marks a question as answerable from the structured
/// knowledge base (scholarship/university domain tables).
static STRUCTURED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bscholarship",
        r"(?i)\buniversit",
        r"(?i)\bvisa\b",
        r"(?i)\branking",
        r"(?i)\bprogram",
        r"(?i)\bcourse",
        r"(?i)\bdegree",
        r"(?i)\btuition\b",
        r"(?i)\badmission",
        r"(?i)\beligib",
        r"(?i)\bdocuments?\s+required\b",
        r"(?i)\bhealth\s+insurance\b",
        r"(?i)\bcampus\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid structured-domain regex"))
    .collect()
});

/// Rule-based routing policy.
///
/// Stops when a usable answer already follows the latest user turn;
/// otherwise routes structured-domain vocabulary to the structured
/// responder and everything else to the web responder.
pub struct KeywordPolicy {
    structured_enabled: bool,
}

impl KeywordPolicy {
    pub fn new(structured_enabled: bool) -> Self {
        Self { structured_enabled }
    }
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RoutingPolicy for KeywordPolicy {
    fn classify(&self, state: &ConversationState) -> RouteDecision {
        // Already answered?
        if state.latest_usable_answer().is_some() {
            return RouteDecision::Stop;
        }

        let question = match state.latest_user_turn() {
            Some(turn) => turn.content.as_str(),
            // Nothing to answer. The router resolves this safely.
            None => return RouteDecision::Stop,
        };

        if self.structured_enabled
            && STRUCTURED_PATTERNS.iter().any(|p| p.is_match(question))
        {
            return RouteDecision::Delegate(RouteTarget::Structured);
        }
        RouteDecision::Delegate(RouteTarget::Web)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use supersearch_core::types::Turn;
    use uuid::Uuid;

    fn state_with(turns: Vec<Turn>) -> ConversationState {
        let mut state = ConversationState::new(Uuid::new_v4(), "guest");
        for t in turns {
            state.push_turn(t);
        }
        state
    }

    // ---- Structured-domain vocabulary ----

    #[test]
    fn test_scholarship_question_routes_structured() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![Turn::user(
            "What scholarships are available for CS students?",
        )]);
        assert_eq!(
            policy.classify(&state),
            RouteDecision::Delegate(RouteTarget::Structured)
        );
    }

    #[test]
    fn test_university_question_routes_structured() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![Turn::user("Which universities offer medicine?")]);
        assert_eq!(
            policy.classify(&state),
            RouteDecision::Delegate(RouteTarget::Structured)
        );
    }

    #[test]
    fn test_visa_and_admission_route_structured() {
        let policy = KeywordPolicy::default();
        for q in [
            "How do I apply for a student visa?",
            "What are the admission requirements?",
            "What documents required for enrollment?",
            "Do I need health insurance?",
        ] {
            let state = state_with(vec![Turn::user(q)]);
            assert_eq!(
                policy.classify(&state),
                RouteDecision::Delegate(RouteTarget::Structured),
                "expected structured for {:?}",
                q
            );
        }
    }

    // ---- Open questions ----

    #[test]
    fn test_general_question_routes_web() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![Turn::user("What's the weather in Kuala Lumpur?")]);
        assert_eq!(
            policy.classify(&state),
            RouteDecision::Delegate(RouteTarget::Web)
        );
    }

    #[test]
    fn test_case_insensitive_matching() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![Turn::user("TELL ME ABOUT SCHOLARSHIPS")]);
        assert_eq!(
            policy.classify(&state),
            RouteDecision::Delegate(RouteTarget::Structured)
        );
    }

    // ---- Already answered ----

    #[test]
    fn test_answered_conversation_stops() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![
            Turn::user("What scholarships are available?"),
            Turn::assistant("Here are 5 scholarships: ..."),
        ]);
        assert_eq!(policy.classify(&state), RouteDecision::Stop);
    }

    #[test]
    fn test_stale_answer_does_not_stop_new_question() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![
            Turn::user("What scholarships are available?"),
            Turn::assistant("Here are 5 scholarships: ..."),
            Turn::user("And what about university rankings?"),
        ]);
        assert_eq!(
            policy.classify(&state),
            RouteDecision::Delegate(RouteTarget::Structured)
        );
    }

    #[test]
    fn test_empty_assistant_turn_does_not_stop() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![Turn::user("scholarships?"), Turn::assistant("")]);
        assert_eq!(
            policy.classify(&state),
            RouteDecision::Delegate(RouteTarget::Structured)
        );
    }

    // ---- Degenerate states ----

    #[test]
    fn test_no_user_turn_stops() {
        let policy = KeywordPolicy::default();
        let state = state_with(vec![]);
        assert_eq!(policy.classify(&state), RouteDecision::Stop);
    }

    // ---- Structured responder disabled ----

    #[test]
    fn test_structured_disabled_routes_everything_web() {
        let policy = KeywordPolicy::new(false);
        let state = state_with(vec![Turn::user("What scholarships are available?")]);
        assert_eq!(
            policy.classify(&state),
            RouteDecision::Delegate(RouteTarget::Web)
        );
    }
}
