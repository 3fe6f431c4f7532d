//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod local_store;
pub mod memory;
pub mod remote;
pub mod telemetry;
