//! Error types.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result alias for snapshot operations.
pub type Result<T> = std::result::Result<T, DnsInfoError>;

/// Errors returned by snapshot operations.
#[derive(Debug, Error)]
pub enum DnsInfoError {
    /// Memory could not be reserved while duplicating a snapshot.
    #[error("allocation failed while copying configuration: {0}")]
    Allocation(#[from] TryReserveError),

    /// An address record carried an unknown or inconsistent family tag.
    #[error("structural error: unrecognized address family {family}")]
    Structural {
        /// The raw `sa_family` value found in the record.
        family: u16,
    },

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The global store was already populated.
    #[error("dns configuration already initialized")]
    AlreadyInitialized,

    /// Reading a property source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DnsInfoError {
    /// Returns `true` for resource exhaustion during a copy.
    #[must_use]
    pub const fn is_allocation(&self) -> bool {
        matches!(self, Self::Allocation(_))
    }

    /// Returns `true` if a corrupt address record was encountered.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}
