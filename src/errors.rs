use crate::classify::ErrorClassification;

/// Error surfaced by a chain adapter behind [`AccessControlService`].
///
/// Adapter errors are carried as rendered messages: the console classifies
/// and displays them but never interprets their structure, which belongs to
/// the adapter layer.
///
/// [`AccessControlService`]: crate::service::AccessControlService
#[derive(thiserror::Error, Debug, Clone)]
pub enum ServiceError {
    #[error("{0}")]
    Adapter(String),
    #[error("Operation {0} is not supported by this adapter")]
    Unsupported(&'static str),
}

impl ServiceError {
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter(message.into())
    }
}

/// Error produced by the access-control mutation layer.
#[derive(thiserror::Error, Debug, Clone)]
pub enum MutationError {
    /// The adapter handle is absent: a configuration problem, not an
    /// on-chain failure. Worded distinctly so dialogs can suggest
    /// reconnection instead of a retry.
    #[error("Access control service is not available. Check the wallet connection and network configuration")]
    ServiceNotAvailable,

    /// The adapter reported a failure. The message is preserved verbatim and
    /// the classification is computed exactly once, at construction.
    #[error("{message}")]
    Execution {
        message: String,
        classification: ErrorClassification,
    },
}

impl MutationError {
    pub fn execution(message: impl Into<String>) -> Self {
        let message = message.into();
        let classification = ErrorClassification::of_message(&message);
        Self::Execution {
            message,
            classification,
        }
    }

    pub fn classification(&self) -> ErrorClassification {
        match self {
            Self::ServiceNotAvailable => ErrorClassification::default(),
            Self::Execution { classification, .. } => *classification,
        }
    }

    pub fn is_network_error(&self) -> bool {
        self.classification().is_network_error
    }

    pub fn is_user_rejection(&self) -> bool {
        self.classification().is_user_rejection
    }
}

impl From<ServiceError> for MutationError {
    fn from(err: ServiceError) -> Self {
        Self::execution(err.to_string())
    }
}

/// Synchronous form-validation error, raised before any mutation call.
///
/// Never classified as network or user-rejection: these are client-detectable
/// input problems and must not trigger a network round-trip.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{target} is already the current {subject}. You cannot transfer it to yourself")]
    SelfTransfer {
        subject: &'static str,
        target: String,
    },
    #[error("Expiration block {expiration} must be greater than current block {current}")]
    ExpirationNotInFuture { expiration: u64, current: u64 },
    #[error("Invalid expiration block: {0}")]
    InvalidExpiration(String),
    #[error("Current block is not available yet. Wait for the chain data to load and try again")]
    CurrentBlockUnavailable,
    #[error("Invalid admin delay: {0}")]
    InvalidDelay(String),
}

/// Error raised while building or serializing an [`AccessSnapshot`].
///
/// Aggregation is all-or-nothing: any fetch failure aborts the whole export
/// and no partial snapshot is emitted.
///
/// [`AccessSnapshot`]: crate::export::AccessSnapshot
#[derive(thiserror::Error, Debug, Clone)]
pub enum ExportError {
    #[error("Access control service is not available for export")]
    ServiceNotAvailable,
    #[error("Contract address is empty")]
    EmptyAddress,
    #[error("Failed to fetch {what} for snapshot: {source}")]
    Fetch {
        what: &'static str,
        source: ServiceError,
    },
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
