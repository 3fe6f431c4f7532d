//! Small helpers shared across layers.

pub mod bytes;
pub mod dates;
pub(crate) mod lock;
