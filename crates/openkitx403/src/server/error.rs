/*
[INPUT]:  Verification failures from the authenticator
[OUTPUT]: Typed AuthError with stable names and HTTP status mapping
[POS]:    Server layer - rejection taxonomy
[UPDATE]: When adding rejection reasons or changing status mapping
*/

use axum::http::StatusCode;
use thiserror::Error;

/// Why a request was not authenticated.
///
/// The `String` payloads are internal reasons for logs; clients only ever see
/// the status code and a generic body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No OpenKitx403 credential presented")]
    MissingCredential,

    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    #[error("Invalid challenge: {0}")]
    InvalidChallenge(String),

    #[error("Challenge expired: {0}")]
    ExpiredChallenge(String),

    #[error("Audience mismatch: {0}")]
    AudienceMismatch(String),

    #[error("Bind mismatch: {0}")]
    BindMismatch(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Challenge already used")]
    ReplayDetected,

    #[error("Replay store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AuthError {
    /// Stable error name for logs and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::MalformedProof(_) => "MALFORMED_PROOF",
            Self::InvalidChallenge(_) => "INVALID_CHALLENGE",
            Self::ExpiredChallenge(_) => "EXPIRED_CHALLENGE",
            Self::AudienceMismatch(_) => "AUDIENCE_MISMATCH",
            Self::BindMismatch(_) => "BIND_MISMATCH",
            Self::InvalidSignature(_) => "INVALID_SIGNATURE",
            Self::ReplayDetected => "REPLAY_DETECTED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Whether the caller should get a fresh challenge and may try again
    pub fn is_rechallengeable(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::MalformedProof(_)
                | Self::InvalidChallenge(_)
                | Self::ExpiredChallenge(_)
        )
    }

    /// 403 for rechallengeable failures, 401 for everything else
    pub fn http_status(&self) -> StatusCode {
        if self.is_rechallengeable() {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::UNAUTHORIZED
        }
    }
}
