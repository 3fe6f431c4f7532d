//! Screen controllers and the collaborator seams they depend on.

pub mod auth;
pub mod comments;
pub mod context;
pub mod detail;
pub mod editor;
pub mod error;
pub mod likes;
pub mod listing;
pub mod manage;
pub mod repos;
pub mod session;
