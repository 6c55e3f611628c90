//! Directory client error types.

use thiserror::Error;

/// Error that can occur while talking to the directory service.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Failed to establish a connection to the directory server.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid bind credentials.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// Client configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A search that must match exactly one entry matched none.
    #[error("no entry matches '{filter}'")]
    NotFound { filter: String },

    /// A search that must match exactly one entry matched several.
    #[error("filter '{filter}' matched {count} entries, expected exactly one")]
    Ambiguous { filter: String, count: usize },

    /// An add collided with an existing entry.
    #[error("entry already exists: {dn}")]
    AlreadyExists { dn: String },

    /// A modify targeted an entry that is not there.
    #[error("no such entry: {dn}")]
    NoSuchObject { dn: String },

    /// A directory operation failed.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A transaction could not be started or committed.
    #[error("transaction failed: {message}")]
    TransactionFailed { message: String },

    /// An LDIF template could not be parsed.
    #[error("invalid template: {message}")]
    InvalidTemplate { message: String },

    /// A template placeholder had no binding in the field set.
    #[error("unbound template placeholder '${{{name}}}'")]
    UnboundPlaceholder { name: String },

    /// An attribute value could not be interpreted.
    #[error("attribute '{attribute}' has unusable value '{value}'")]
    InvalidAttribute { attribute: String, value: String },

    /// An entry is missing an attribute the schema requires.
    #[error("entry '{dn}' has no '{attribute}' attribute")]
    MissingAttribute { dn: String, attribute: String },
}

impl DirectoryError {
    /// Create a `ConnectionFailed` error without a source.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a `ConnectionFailed` error with a source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an `OperationFailed` error without a source.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an `OperationFailed` error with a source.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether retrying the operation could plausibly succeed.
    ///
    /// Precondition violations (`NotFound`, `Ambiguous`) and configuration
    /// or template errors are permanent; connection-level failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::OperationFailed { .. }
                | Self::TransactionFailed { .. }
        )
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_carries_filter() {
        let err = DirectoryError::NotFound {
            filter: "(&(objectClass=server)(cn=mdb1))".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no entry matches '(&(objectClass=server)(cn=mdb1))'"
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn test_ambiguous_display_carries_count() {
        let err = DirectoryError::Ambiguous {
            filter: "(cn=x)".to_string(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "filter '(cn=x)' matched 2 entries, expected exactly one"
        );
    }

    #[test]
    fn test_unbound_placeholder_display() {
        let err = DirectoryError::UnboundPlaceholder {
            name: "USERNAME".to_string(),
        };
        assert_eq!(err.to_string(), "unbound template placeholder '${USERNAME}'");
    }

    #[test]
    fn test_transient_classification() {
        assert!(DirectoryError::connection_failed("refused").is_transient());
        assert!(!DirectoryError::AuthenticationFailed.is_transient());
    }
}
