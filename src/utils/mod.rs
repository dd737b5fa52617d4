//! Shared utilities: IPv4 network helpers and configuration validation.

pub mod ip_utils;
pub mod validation;

pub use validation::{validate_config, validate_hostnames};
