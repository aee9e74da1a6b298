//! Terminal user interface

pub mod app;
pub mod conversation;

pub use app::run_chat;
