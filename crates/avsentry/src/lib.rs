//! avsentry library - exposes modules for testing.

pub mod alert;
pub mod cli;
pub mod command;
pub mod config;
pub mod discover;
pub mod engine;
pub mod error;
pub mod firmware;
pub mod interrogate;
pub mod mute;
pub mod probe;
pub mod signal;
pub mod transport;
