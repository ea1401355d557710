//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to the spa controller
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("No response within deadline")]
    Timeout,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Write not acknowledged: expected '{expected}', got '{actual}'")]
    WriteNotAcknowledged { expected: String, actual: String },

    #[error("Unrecognized firmware variant marker: '{0}'")]
    UnknownVariant(String),

    #[error("Invalid write request: {0}")]
    InvalidWrite(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
