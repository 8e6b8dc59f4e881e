//! Observable routing events.
//!
//! The router emits one event per state transition so that terminal
//! transitions (stop, fallback) are regular, inspectable values rather
//! than control-flow exceptions.

use serde::{Deserialize, Serialize};

use supersearch_core::types::{RouteTarget, RoutingFault};

/// One state transition in a routing loop, in occurrence order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RouterEvent {
    /// The decision step chose to delegate.
    Delegated { target: RouteTarget, depth: u32 },
    /// A responder returned turns (possibly zero).
    TurnsReceived {
        target: RouteTarget,
        count: usize,
        usable: bool,
    },
    /// A responder requested a transfer of control.
    HandoffRequested { from: RouteTarget, target: String },
    /// A fault was recorded on the conversation state.
    FaultRecorded { fault: RoutingFault },
    /// The loop entered the fallback path.
    FallbackTriggered { fault: RoutingFault },
    /// The synthetic placeholder answer was used.
    PlaceholderUsed,
    /// The loop reached its terminal state with an answer.
    Stopped { depth: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = RouterEvent::Delegated {
            target: RouteTarget::Web,
            depth: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"delegated\""));
        assert!(json.contains("\"web\""));

        let restored: RouterEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn test_fault_event_carries_marker() {
        let event = RouterEvent::FallbackTriggered {
            fault: RoutingFault::RecursionExceeded,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("recursion_exceeded"));
    }
}
