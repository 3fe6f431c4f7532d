//! Text front-end: command handlers, screen assembly and views.

pub mod commands;
pub mod screens;
pub mod views;
