//! Terminal client for a server-driven complaint intake wizard.
//!
//! The server declares, with every reply, which input affordance the next
//! user action needs. This crate renders that conversation in a terminal
//! and keeps the local per-turn state (selection sets, autocomplete
//! selections) consistent with it.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod suggest;
pub mod tui;
pub mod ui;
