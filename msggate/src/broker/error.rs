//! Broker error types with context.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Failure modes of the message broker.
///
/// # Example
///
/// ```rust
/// use msggate::broker::BrokerError;
///
/// let error = BrokerError::AlreadyAttached("sensor".to_string());
/// assert!(error.to_string().contains("already attached"));
/// ```
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A module with the same name is already attached
    ///
    /// Attaching is not idempotent; a second attach under the same name is
    /// refused without touching the existing registration.
    #[error("module already attached to broker: {0}")]
    AlreadyAttached(String),

    /// The named module is not attached
    ///
    /// Raised by detach for unknown modules and by publish when the producer
    /// has already been detached (a publication after detach is a lifecycle
    /// violation and is refused).
    #[error("module not attached to broker: {0}")]
    NotAttached(String),

    /// The broker refuses new work because teardown has begun
    #[error("broker is shutting down")]
    ShuttingDown,
}
