//! Shared CLI presentation utilities.
//!
//! Format-only helpers; no service calls happen here.

pub mod tables;

pub use tables::{format_optional, print_json, print_separator, truncate_string};
