//! Fallback policy: the guaranteed-termination safety net.
//!
//! When the main routing loop cannot produce an answer (depth exhausted,
//! responder failure, invalid handoff), the fallback policy re-enters the
//! loop with the route forced to the designated fallback responder and a
//! small hop budget. If even that yields nothing usable, a fixed
//! placeholder turn is synthesized so the caller never receives an empty
//! result.

use supersearch_core::types::{ConversationState, RouteTarget, Turn};

use crate::events::RouterEvent;
use crate::router::Router;

/// What happens when the primary routing loop gives up.
#[derive(Clone, Debug)]
pub struct FallbackPolicy {
    /// Responder forced when the loop fails. The web responder is the
    /// designated fallback: it can always attempt an answer from open
    /// data even without structured access.
    pub target: RouteTarget,
    /// Fixed, non-empty, user-facing text used as the last resort.
    pub placeholder: String,
    /// Hop budget for the recovery pass. Kept small so recovery cannot
    /// re-trigger the limit it is recovering from.
    pub depth: u32,
}

impl FallbackPolicy {
    pub fn new(target: RouteTarget, placeholder: String, depth: u32) -> Self {
        Self {
            target,
            placeholder,
            depth: depth.max(1),
        }
    }

    /// Produce the terminal answer after the main loop failed.
    ///
    /// Clears the recorded fault, forces `pending_route` to the fallback
    /// target, resets the hop counter to the recovery budget, and drives
    /// the loop again. Falls back to the usable turn produced during
    /// recovery, then to the synthesized placeholder.
    pub(crate) async fn recover(
        &self,
        router: &Router,
        state: &mut ConversationState,
        events: &mut Vec<RouterEvent>,
    ) -> Turn {
        let recover_base = state.turns.len();

        state.fault = None;
        state.pending_route = Some(self.target);
        state.depth = 0;

        if let Some(turn) = router.drive(state, self.depth, events).await {
            return turn;
        }

        // The recovery pass ran out of budget; any usable turn it produced
        // still beats the placeholder.
        if let Some(turn) = state.turns[recover_base..].iter().rev().find(|t| t.is_usable()) {
            return turn.clone();
        }

        events.push(RouterEvent::PlaceholderUsed);
        tracing::warn!("Fallback produced nothing usable; returning placeholder answer");
        let turn = Turn::assistant(&self.placeholder);
        state.push_turn(turn.clone());
        turn
    }
}
