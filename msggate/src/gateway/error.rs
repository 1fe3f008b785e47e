//! Gateway error types and the error taxonomy.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::broker::BrokerError;
use crate::module::LoaderError;

/// Broad classification of a [`GatewayError`].
///
/// Lets callers (a CLI layer, an embedding application) map failures to
/// exit codes or retry policy without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or conflicting input; the operation had no side effects
    InvalidArgument,
    /// A referenced entity was absent at the moment of lookup
    NotFound,
    /// A loader refused to load, configure, or construct a module
    LoaderFailure,
    /// The operation is not valid in the gateway's current state
    LifecycleViolation,
}

/// Failure modes of gateway controller operations.
///
/// Errors inside delivery workers never surface here; a misbehaving module
/// is contained by the broker. These are the mutator-facing failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The module name was empty, non-printable, or the reserved `"*"`
    #[error("invalid module name: {0:?}")]
    InvalidModuleName(String),

    /// A module of that name already exists on this gateway
    #[error("duplicate module name: {0}")]
    DuplicateModuleName(String),

    /// No module matched the given name or handle
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The configuration referenced a loader that is not registered
    #[error("loader not registered: {0}")]
    LoaderNotFound(String),

    /// The module library targets a newer API than this gateway supports
    #[error("module {module} requires API version {version}, gateway supports {supported}")]
    UnsupportedApiVersion {
        /// Name of the offending module
        module: String,
        /// Version the library reported
        version: u32,
        /// Highest version this gateway accepts
        supported: u32,
    },

    /// The link's source or sink was empty
    #[error("link source and sink must be non-empty")]
    InvalidLinkEntry,

    /// The exact link already exists
    #[error("duplicate link: {link_source} -> {sink}")]
    DuplicateLink {
        /// Link source (possibly the wildcard)
        link_source: String,
        /// Link sink
        sink: String,
    },

    /// A link endpoint did not resolve to a registered module
    #[error("link endpoint is not a registered module: {0}")]
    LinkEndpointNotFound(String),

    /// The gateway has been destroyed; no further operations are accepted
    #[error("gateway has been destroyed")]
    Destroyed,

    /// A loader operation failed
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// A broker operation failed
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

impl GatewayError {
    /// Classify the error into the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidModuleName(_)
            | Self::DuplicateModuleName(_)
            | Self::InvalidLinkEntry
            | Self::DuplicateLink { .. } => ErrorKind::InvalidArgument,

            Self::ModuleNotFound(_)
            | Self::LoaderNotFound(_)
            | Self::LinkEndpointNotFound(_)
            | Self::Broker(BrokerError::NotAttached(_)) => ErrorKind::NotFound,

            Self::UnsupportedApiVersion { .. } | Self::Loader(_) => ErrorKind::LoaderFailure,

            Self::Destroyed
            | Self::Broker(BrokerError::AlreadyAttached(_) | BrokerError::ShuttingDown) => {
                ErrorKind::LifecycleViolation
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_kinds() {
        assert_eq!(
            GatewayError::DuplicateModuleName("m".to_string()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            GatewayError::DuplicateLink {
                link_source: "a".to_string(),
                sink: "b".to_string(),
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(GatewayError::InvalidLinkEntry.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(
            GatewayError::ModuleNotFound("m".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GatewayError::LoaderNotFound("l".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GatewayError::LinkEndpointNotFound("sink".to_string()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_loader_failure_kinds() {
        assert_eq!(
            GatewayError::from(LoaderError::LoadFailed("nope".to_string())).kind(),
            ErrorKind::LoaderFailure
        );
        assert_eq!(
            GatewayError::UnsupportedApiVersion {
                module: "m".to_string(),
                version: 9,
                supported: 1,
            }
            .kind(),
            ErrorKind::LoaderFailure
        );
    }

    #[test]
    fn test_lifecycle_violation_kinds() {
        assert_eq!(GatewayError::Destroyed.kind(), ErrorKind::LifecycleViolation);
        assert_eq!(
            GatewayError::from(BrokerError::ShuttingDown).kind(),
            ErrorKind::LifecycleViolation
        );
        assert_eq!(
            GatewayError::from(BrokerError::AlreadyAttached("m".to_string())).kind(),
            ErrorKind::LifecycleViolation
        );
    }

    #[test]
    fn test_broker_not_attached_maps_to_not_found() {
        assert_eq!(
            GatewayError::from(BrokerError::NotAttached("m".to_string())).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_display_carries_context() {
        let error = GatewayError::UnsupportedApiVersion {
            module: "sensor".to_string(),
            version: 3,
            supported: 1,
        };
        let message = error.to_string();

        assert!(message.contains("sensor"));
        assert!(message.contains('3'));
        assert!(message.contains('1'));
    }
}
