//! Tool-configuration store for chatlink.
//!
//! Reads JSON tool-configuration documents from a directory, validates their
//! structure, caches them by name and validates call arguments against the
//! declared field rules.
#![deny(unused_crate_dependencies)]

pub mod error;
pub mod store;
pub mod validate;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use store::ConfigStore;
pub use validate::{check_structure, validate_arguments};
