use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastError {
    #[error("mDNS discovery failed: {0}")]
    Discovery(String),
    #[error("Cannot connect to {device}: {reason}")]
    Connection { device: String, reason: String },
    #[error("{device} did not report an active media session within {timeout:?}")]
    ReadinessTimeout { device: String, timeout: Duration },
    #[error("Cast command '{operation}' failed: {reason}")]
    Command { operation: String, reason: String },
    #[error("Cast operation '{0}' is not supported by this backend")]
    Unsupported(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CastError {
    pub fn connection(device: &str, reason: impl ToString) -> Self {
        CastError::Connection {
            device: device.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn command(operation: &str, reason: impl ToString) -> Self {
        CastError::Command {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported(operation: &str) -> Self {
        CastError::Unsupported(operation.to_string())
    }
}
