/*
[INPUT]:  Error sources (HTTP, challenge decoding, signing, key files)
[OUTPUT]: Structured client error type with retry hints
[POS]:    Error handling layer - errors surfaced by the client side of the crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::codec::CodecError;
use crate::types::{ChallengeError, HeaderError};

/// Error type for the OpenKitx403 client and signers
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server still refused the request after the signed retry
    #[error("Authentication failed (status {status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    /// Server sent a challenge that could not be decoded
    #[error("Invalid challenge: {0}")]
    Challenge(#[from] ChallengeError),

    /// Auth header could not be parsed
    #[error("Invalid auth header: {0}")]
    Header(#[from] HeaderError),

    /// Encoding or canonicalization failed
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration or key material error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wallet refused or failed to sign
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Key file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(err) => err.is_timeout() || err.is_connect(),
            ClientError::InvalidResponse(_) => true,
            _ => false,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::AuthenticationFailed { .. }
                | ClientError::Challenge(_)
                | ClientError::Header(_)
                | ClientError::Signing(_)
        )
    }

    /// Terminal failure built from the final response status and body
    pub fn authentication_failed(status: StatusCode, message: impl Into<String>) -> Self {
        ClientError::AuthenticationFailed {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
