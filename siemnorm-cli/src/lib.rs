//! siemnorm CLI library
//!
//! The `siemnorm` binary is a thin wrapper over these modules so that
//! command handlers can be exercised from integration tests.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
