//! Terminal client for a support chatbot backend.

pub mod auth;
pub mod backend;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod escalation;
pub mod events;
pub mod feedback;
pub mod format;
pub mod session;
pub mod storage;
pub mod title;
pub mod transcript;
pub mod ui;
pub mod view;

#[cfg(test)]
mod testing;
