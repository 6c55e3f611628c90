//! Provisioning error types.

use thiserror::Error;

use exodb_directory::DirectoryError;

/// Error that can occur during a provisioning operation.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The directory service rejected or failed an operation.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A counter value does not fit the 48-bit folder-id field.
    #[error("global counter value {value:#x} exceeds the 48-bit identifier field")]
    CounterOutOfRange { value: u64 },

    /// A counter attribute read from the directory was not valid hex.
    #[error("attribute '{attribute}' holds non-numeric value '{value}'")]
    InvalidCounterValue { attribute: String, value: String },

    /// The user record is already provisioned.
    #[error("user '{username}' is already provisioned")]
    UserAlreadyExists { username: String },
}

/// Result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
