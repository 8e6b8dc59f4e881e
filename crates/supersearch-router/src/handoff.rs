//! Handoff directives: how a responder tells the router to transfer
//! control to another responder.
//!
//! A directive is a named capability request, not a direct call: the
//! responder names a target and the router validates it against its
//! registry before obeying. A directive names exactly one target; the
//! router never runs two responders in the same hop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An instruction to transfer control to a named responder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandoffDirective {
    /// Registered name of the target responder.
    pub target: String,
    /// Token tying this directive to the decision step that receives it,
    /// carried through logs for traceability.
    pub correlation: Uuid,
    /// Optional explanation for why control is being transferred.
    pub reason: Option<String>,
}

impl HandoffDirective {
    /// Create a directive naming a target responder.
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            correlation: Uuid::new_v4(),
            reason: None,
        }
    }

    /// Attach a reason for the transfer.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
