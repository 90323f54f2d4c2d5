use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum SqlDispatchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}
