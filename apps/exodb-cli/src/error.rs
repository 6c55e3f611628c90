//! CLI error types.

use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Directory(#[from] exodb_directory::DirectoryError),

    #[error(transparent)]
    Provision(#[from] exodb_provision::ProvisionError),

    #[error("invalid counter value '{0}': expected a 0x-prefixed hex string")]
    InvalidCounter(String),
}
