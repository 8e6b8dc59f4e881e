//! Supervisor routing engine for supersearch.
//!
//! Owns the per-request control loop that decides which responder runs
//! next, enforces the hop bound, and guarantees that every request ends
//! in a non-empty assistant turn via the fallback policy.

pub mod error;
pub mod events;
pub mod fallback;
pub mod handoff;
pub mod policy;
pub mod responder;
pub mod router;

pub use error::{ResponderError, RouterError};
pub use events::RouterEvent;
pub use fallback::FallbackPolicy;
pub use handoff::HandoffDirective;
pub use policy::{KeywordPolicy, RouteDecision, RoutingPolicy};
pub use responder::{Responder, ResponderReply};
pub use router::{RouteOutcome, Router};
