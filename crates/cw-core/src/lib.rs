//! CardWatch core library
//!
//! This library backs the `cardwatch` binary:
//! - Exit codes for CLI operations
//! - Configuration loading (TOML, env, XDG)
//! - Structured logging setup
//! - Dashboard generation with tiered fallback
//! - Assistant chat sessions and scheduled reports
//!
//! The binary entry point is in `main.rs`.

pub mod chat;
pub mod config;
pub mod dashboard;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod schedule;

#[cfg(test)]
pub mod test_utils;
