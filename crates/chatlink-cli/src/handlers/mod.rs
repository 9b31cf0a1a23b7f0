//! Command handlers.
//!
//! Handlers are thin: parse CLI-specific input, call the tool service on the
//! [`CliContext`](crate::CliContext), format the outcome for the terminal.
//! Service failures are printed, and reported as an error exit only when the
//! operation itself failed.

pub mod configs;
pub mod info;
pub mod invoke;
pub mod oauth;
pub mod schemas;
pub mod server;
pub mod tools;
