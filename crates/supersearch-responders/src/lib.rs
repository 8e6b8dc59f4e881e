//! The concrete responders the supervisor can delegate to.
//!
//! A structured responder over the SQLite knowledge base, a web-search
//! responder over a pluggable search backend, and the predefined-answer
//! lookup consulted before routing.

pub mod canned;
pub mod structured;
pub mod web;

pub use canned::PredefinedAnswers;
pub use structured::StructuredResponder;
pub use web::{HttpSearchBackend, SearchBackend, SearchHit, StaticBackend, WebResponder};
