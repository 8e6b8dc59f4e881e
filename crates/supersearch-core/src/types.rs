use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a turn in a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human asking questions.
    User,
    /// A responder (or the router itself) answering.
    Assistant,
    /// Internal bookkeeping turns (handoff notes, diagnostics).
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse a role from its storage representation.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

/// A registered responder the router can delegate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// Structured knowledge-base lookup (scholarships, universities).
    Structured,
    /// Open web search.
    Web,
}

impl RouteTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteTarget::Structured => "structured",
            RouteTarget::Web => "web",
        }
    }

    pub fn parse(s: &str) -> Option<RouteTarget> {
        match s {
            "structured" => Some(RouteTarget::Structured),
            "web" => Some(RouteTarget::Web),
            _ => None,
        }
    }
}

impl std::fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error marker recorded in conversation state when the routing loop
/// cannot proceed normally.
///
/// A fault is a regular value checked by the router's decision step, not an
/// exception: hitting the depth bound or losing a responder both transition
/// the loop into its fallback path through an ordinary branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingFault {
    /// The hop counter reached the configured maximum.
    RecursionExceeded,
    /// A responder (or the substrate underneath it) failed unexpectedly.
    ExecutionError,
}

impl RoutingFault {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingFault::RecursionExceeded => "recursion_exceeded",
            RoutingFault::ExecutionError => "execution_error",
        }
    }
}

// =============================================================================
// Turn
// =============================================================================

/// One utterance in a conversation.
///
/// Immutable once created; ordering within a conversation is significant.
/// `content` is always present; an empty string is a valid value that is
/// distinguishable from "no turn was produced".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique identifier for this turn.
    pub id: Uuid,
    /// Who produced the turn.
    pub role: Role,
    /// The utterance text. May be empty.
    pub content: String,
    /// Which responder produced this turn, if any. Used for output
    /// selection when several responders contributed to a request.
    pub responder: Option<String>,
    /// When this turn was created.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            responder: None,
            created_at: Utc::now(),
        }
    }

    /// Create an assistant turn with no originating responder.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            responder: None,
            created_at: Utc::now(),
        }
    }

    /// Create an assistant turn tagged with its originating responder.
    pub fn assistant_from(responder: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            responder: Some(responder.into()),
            created_at: Utc::now(),
        }
    }

    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::System,
            content: content.into(),
            responder: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this turn can serve as an answer: an assistant turn whose
    /// content is non-empty after trimming.
    pub fn is_usable(&self) -> bool {
        self.role == Role::Assistant && !self.content.trim().is_empty()
    }
}

// =============================================================================
// ConversationState
// =============================================================================

/// The ordered turn sequence for one conversation plus the routing metadata
/// for the request currently in flight.
///
/// Owned exclusively by the router for the duration of one request. The turn
/// sequence is persisted by the transcript store; `depth`, `done`,
/// `pending_route`, and `fault` are transient and discarded when the request
/// completes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationState {
    /// Session this conversation belongs to.
    pub session_id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// Ordered, append-only turn sequence.
    pub turns: Vec<Turn>,
    /// Responder hops taken so far in the current routing loop.
    #[serde(skip)]
    pub depth: u32,
    /// Set when a terminal answer has been reached.
    #[serde(skip)]
    pub done: bool,
    /// Responder that should run next, if a handoff or the fallback policy
    /// forced one.
    #[serde(skip)]
    pub pending_route: Option<RouteTarget>,
    /// Error marker set when the loop cannot proceed normally.
    #[serde(skip)]
    pub fault: Option<RoutingFault>,
}

impl ConversationState {
    /// Create an empty conversation for a session.
    pub fn new(session_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            session_id,
            user_id: user_id.into(),
            turns: Vec::new(),
            depth: 0,
            done: false,
            pending_route: None,
            fault: None,
        }
    }

    /// Append a turn to the sequence.
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The most recent user turn, if any.
    pub fn latest_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    /// The most recent usable assistant turn produced after the latest user
    /// turn, if any. This is the candidate answer for the request.
    pub fn latest_usable_answer(&self) -> Option<&Turn> {
        let last_user = self
            .turns
            .iter()
            .rposition(|t| t.role == Role::User)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.turns[last_user..].iter().rev().find(|t| t.is_usable())
    }

    /// A copy of this state whose turn sequence is windowed to the most
    /// recent `n` turns. Routing metadata carries over unchanged.
    pub fn recent_window(&self, n: usize) -> ConversationState {
        let start = self.turns.len().saturating_sub(n);
        ConversationState {
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            turns: self.turns[start..].to_vec(),
            depth: self.depth,
            done: self.done,
            pending_route: self.pending_route,
            fault: self.fault,
        }
    }
}

// =============================================================================
// SessionSummary
// =============================================================================

/// Summary row describing one stored session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// Short title derived from the first user turn.
    pub title: String,
    /// Epoch seconds.
    pub started_at: i64,
    /// Epoch seconds.
    pub last_message_at: i64,
    pub turn_count: u32,
}

// =============================================================================
// Tests
// =============================================================================
