//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check static mounts point at absolute directories
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::path::Path;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a configuration for values serde cannot reject on its own.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }
    if config.server_name.trim().is_empty() {
        errors.push(ValidationError::new("server_name", "must not be empty"));
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::new("timeouts.read_secs", "must be greater than zero"));
    }
    if config.timeouts.shutdown_secs == 0 {
        errors.push(ValidationError::new("timeouts.shutdown_secs", "must be greater than zero"));
    }
    if config.keep_alive.max_timeout_secs == 0 {
        errors.push(ValidationError::new("keep_alive.max_timeout_secs", "must be greater than zero"));
    }
    if config.limits.max_header_bytes == 0 {
        errors.push(ValidationError::new("limits.max_header_bytes", "must be greater than zero"));
    }
    if config.limits.max_headers == 0 {
        errors.push(ValidationError::new("limits.max_headers", "must be greater than zero"));
    }
    if config.keep_alive.max_requests == 0 {
        errors.push(ValidationError::new("keep_alive.max_requests", "must be greater than zero"));
    }

    for (i, mount) in config.statics.iter().enumerate() {
        if !mount.prefix.starts_with('/') {
            errors.push(ValidationError::new(
                format!("statics[{}].prefix", i),
                "must start with '/'",
            ));
        }
        if !Path::new(&mount.directory).is_absolute() {
            errors.push(ValidationError::new(
                format!("statics[{}].directory", i),
                "must be an absolute path",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
