//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod routes;
pub mod search;
pub mod slug;
