//! Unified error type for the realme-ota public API
//!
//! Internal modules keep their own error types ([`CodecError`],
//! [`ConfigError`]) for precise handling. [`OtaError`] is what every
//! top-level operation returns.
//!
//! # Example
//!
//! ```no_run
//! use realme_ota::OtaError;
//!
//! fn check() -> Result<(), OtaError> {
//!     // All update-check operations return OtaError
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::CodecError;

/// Unified error type for all update-check operations
///
/// # Error Categories
///
/// - **Transport**: connection, DNS, TLS or timeout failure
/// - **InvalidResponse**: the server answered with a non-200 status
/// - **ProtocolRejected**: the server returned an `errMsg`
/// - **DecryptionFailed**: the response payload could not be decoded
/// - **FieldNotFound**: the requested projection key is absent
/// - **OutputWriteFailed**: dumping the result to a file failed (non-fatal)
#[derive(Debug, Error)]
pub enum OtaError {
    /// Caller-supplied input could not be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Protocol configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network, timeout or TLS failure while talking to the endpoint
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 HTTP status
    #[error("Received invalid response: HTTP {0}")]
    InvalidResponse(u16),

    /// Server-side rejection carried in `errMsg`
    #[error("Request was rejected: {0}")]
    ProtocolRejected(String),

    /// The request body could not be encrypted
    #[error("Failed to encrypt request: {0}")]
    EncryptionFailed(#[source] CodecError),

    /// Cryptographic or JSON failure on the response payload
    #[error("Failed to decrypt response: {0}")]
    DecryptionFailed(#[from] CodecError),

    /// Requested output field does not exist in the decrypted document
    #[error("Invalid response value: {0}")]
    FieldNotFound(String),

    /// Writing the result to disk failed
    #[error("Failed to write response to {}: {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OtaError {
    /// Process exit code for this error kind. Zero is reserved for success.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Config(_) => 2,
            Self::Transport(_) => 3,
            Self::InvalidResponse(_) => 4,
            Self::ProtocolRejected(_) => 5,
            Self::DecryptionFailed(_) => 6,
            Self::FieldNotFound(_) => 7,
            Self::EncryptionFailed(_) => 8,
            Self::OutputWriteFailed { .. } => 0,
        }
    }

    /// Returns false for the one kind that must not abort the run
    ///
    /// A failed dump still means the update data was retrieved correctly.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::OutputWriteFailed { .. })
    }

    /// Returns a suggestion for resolving this error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::ProtocolRejected(_) => {
                Some("Check that the product model and OTA version belong together")
            }
            Self::InvalidResponse(_) => Some("Try another region with --region"),
            Self::Transport(e) if e.is_timeout() => Some("Increase the timeout with --timeout"),
            Self::DecryptionFailed(_) => {
                Some("The configured keys may not match the protocol version")
            }
            _ => None,
        }
    }

    /// Returns true if this is a network-level failure
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
