//! The supervisor: a per-request control loop that alternates between
//! deciding and delegating until a terminal answer exists.
//!
//! States: Deciding, Delegating(target), Stopped, FallbackTriggered.
//! Stopped is the only terminal state exposed to callers; the fallback
//! policy guarantees it is always reached with a non-empty answer.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use supersearch_core::config::RoutingConfig;
use supersearch_core::types::{ConversationState, RouteTarget, RoutingFault, Turn};

use crate::error::RouterError;
use crate::events::RouterEvent;
use crate::fallback::FallbackPolicy;
use crate::policy::{RouteDecision, RoutingPolicy};
use crate::responder::Responder;

/// Result of routing one request.
#[derive(Clone, Debug)]
pub struct RouteOutcome {
    /// The terminal answer. Always an assistant turn with non-empty
    /// content.
    pub answer: Turn,
    /// Every turn appended to the conversation during this request,
    /// in order, for the caller to persist.
    pub new_turns: Vec<Turn>,
    /// Ordered state-transition trace.
    pub events: Vec<RouterEvent>,
    /// The fault that pushed the loop into its fallback path, if any.
    pub fault: Option<RoutingFault>,
}

/// Non-terminal phases of the routing loop.
enum Phase {
    Deciding,
    Delegating(RouteTarget),
}

/// The supervisor routing engine.
///
/// Owns the registered responders, the routing policy, and the fallback
/// policy. One `run` call services exactly one user request; hops within
/// a request are strictly sequential (one responder at a time, never a
/// fan-out).
pub struct Router {
    responders: HashMap<String, Arc<dyn Responder>>,
    policy: Arc<dyn RoutingPolicy>,
    max_depth: u32,
    fallback: FallbackPolicy,
}

impl Router {
    /// Create a router with no responders registered yet.
    pub fn new(policy: Arc<dyn RoutingPolicy>, config: &RoutingConfig) -> Self {
        Self {
            responders: HashMap::new(),
            policy,
            max_depth: config.max_depth.max(1),
            fallback: FallbackPolicy::new(
                RouteTarget::Web,
                config.fallback_text.clone(),
                config.fallback_depth,
            ),
        }
    }

    /// Register a responder under its own name.
    pub fn register(&mut self, responder: Arc<dyn Responder>) {
        self.responders
            .insert(responder.name().to_string(), responder);
    }

    /// Names of the registered responders.
    pub fn responder_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.responders.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Route one request to a terminal answer.
    ///
    /// The state's turn sequence must end in the newest user turn. On
    /// return the sequence has one or more turns appended and the outcome
    /// carries an answer with non-empty content, under every reachable
    /// combination of responder failures.
    pub async fn run(&self, state: &mut ConversationState) -> RouteOutcome {
        let base_len = state.turns.len();

        // A request always starts from clean routing metadata.
        state.depth = 0;
        state.done = false;
        state.pending_route = None;
        state.fault = None;

        if self.responders.is_empty() {
            warn!("{}", RouterError::NoResponders);
        }

        let mut events = Vec::new();
        let mut trigger_fault = None;

        let answer = match self.drive(state, self.max_depth, &mut events).await {
            Some(turn) => turn,
            None => {
                let fault = state.fault.unwrap_or(RoutingFault::ExecutionError);
                trigger_fault = Some(fault);
                events.push(RouterEvent::FallbackTriggered { fault });
                warn!(
                    fault = fault.as_str(),
                    "Routing loop could not produce an answer; entering fallback"
                );
                self.fallback.recover(self, state, &mut events).await
            }
        };

        state.done = true;
        RouteOutcome {
            answer,
            new_turns: state.turns[base_len..].to_vec(),
            events,
            fault: trigger_fault,
        }
    }

    /// Drive the decide/delegate loop until an answer is found or the
    /// loop gives up.
    ///
    /// Returns `None` when a fault was recorded (depth exhausted,
    /// responder error, invalid handoff, or a stop decision with no
    /// answer to stop on); the caller decides how to recover.
    pub(crate) async fn drive(
        &self,
        state: &mut ConversationState,
        budget: u32,
        events: &mut Vec<RouterEvent>,
    ) -> Option<Turn> {
        let mut phase = Phase::Deciding;

        loop {
            phase = match phase {
                Phase::Deciding => {
                    if state.fault.is_some() {
                        return None;
                    }

                    // A pending route (handoff or fallback forcing) wins
                    // over the policy.
                    let decision = match state.pending_route.take() {
                        Some(target) => RouteDecision::Delegate(target),
                        None => self.policy.classify(state),
                    };

                    match decision {
                        RouteDecision::Stop => match state.latest_usable_answer() {
                            Some(turn) => {
                                events.push(RouterEvent::Stopped { depth: state.depth });
                                debug!(depth = state.depth, "Routing loop stopped with answer");
                                return Some(turn.clone());
                            }
                            None => {
                                // A stop decision with nothing to stop on is
                                // a policy inconsistency, not a terminal
                                // state.
                                warn!("Policy chose stop but no usable answer exists");
                                self.record_fault(state, RoutingFault::ExecutionError, events);
                                return None;
                            }
                        },
                        RouteDecision::Delegate(target) => {
                            if state.depth >= budget {
                                self.record_fault(state, RoutingFault::RecursionExceeded, events);
                                return None;
                            }
                            Phase::Delegating(target)
                        }
                    }
                }

                Phase::Delegating(target) => {
                    let Some(responder) = self.responders.get(target.as_str()) else {
                        warn!("{}", RouterError::UnknownTarget(target.to_string()));
                        self.record_fault(state, RoutingFault::ExecutionError, events);
                        return None;
                    };

                    events.push(RouterEvent::Delegated {
                        target,
                        depth: state.depth,
                    });
                    debug!(target = %target, depth = state.depth, "Delegating hop");

                    match responder.invoke(state).await {
                        Ok(reply) => {
                            events.push(RouterEvent::TurnsReceived {
                                target,
                                count: reply.turns.len(),
                                usable: reply.has_usable_turn(),
                            });
                            for turn in reply.turns {
                                state.push_turn(turn);
                            }

                            if let Some(handoff) = reply.handoff {
                                match RouteTarget::parse(&handoff.target) {
                                    Some(next)
                                        if self.responders.contains_key(next.as_str()) =>
                                    {
                                        debug!(
                                            from = %target,
                                            to = %next,
                                            correlation = %handoff.correlation,
                                            reason = handoff.reason.as_deref().unwrap_or(""),
                                            "Handoff accepted"
                                        );
                                        events.push(RouterEvent::HandoffRequested {
                                            from: target,
                                            target: handoff.target,
                                        });
                                        state.pending_route = Some(next);
                                    }
                                    _ => {
                                        warn!(
                                            "{}",
                                            RouterError::UnknownTarget(handoff.target.clone())
                                        );
                                        self.record_fault(
                                            state,
                                            RoutingFault::ExecutionError,
                                            events,
                                        );
                                        return None;
                                    }
                                }
                            }

                            state.depth += 1;
                            Phase::Deciding
                        }
                        Err(e) => {
                            // Any unexpected responder failure: record the
                            // fault and let the caller fall back. The failed
                            // responder is not retried within this request.
                            warn!(target = %target, error = %e, "Responder failed");
                            self.record_fault(state, RoutingFault::ExecutionError, events);
                            return None;
                        }
                    }
                }
            };
        }
    }

    fn record_fault(
        &self,
        state: &mut ConversationState,
        fault: RoutingFault,
        events: &mut Vec<RouterEvent>,
    ) {
        state.fault = Some(fault);
        events.push(RouterEvent::FaultRecorded { fault });
    }
}

// =============================================================================
// Tests
// =============================================================================
