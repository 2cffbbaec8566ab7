//! Error types for orgscan-inventory

use orgscan_exec::ExecError;
use thiserror::Error;

use crate::retry::RetryError;

/// Errors that can occur during inventory operations
#[derive(Error, Debug, Clone)]
pub enum InventoryError {
    /// A remote query failed on every attempt
    #[error(transparent)]
    Remote(#[from] RetryError<ExecError>),

    /// Failed to decode query records
    #[error("parse error in {operation}: {message}")]
    ParseError {
        /// Operation whose records failed to decode
        operation: String,
        /// Decoder message
        message: String,
    },

    /// The organization query returned no record
    #[error("organization record not found")]
    OrganizationNotFound,

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl InventoryError {
    /// Name of the remote operation that failed, if any
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        match self {
            InventoryError::Remote(e) => Some(&e.operation),
            InventoryError::ParseError { operation, .. } => Some(operation),
            InventoryError::OrganizationNotFound | InventoryError::ConfigError(_) => None,
        }
    }
}
