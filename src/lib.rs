//! Client core for Spiritual Vitamins: domain rules, screen controllers and
//! the adapters that connect them to the hosted backend.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
