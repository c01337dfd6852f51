/*
[INPUT]:  Server identity, request scope, and issuance times
[OUTPUT]: Challenge values and their base64url transport form
[POS]:    Data layer - the payload every signature is made over
[UPDATE]: When challenge fields, version, or validation rules change
*/

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::codec::{self, CodecError};

/// Protocol version carried in `v`
pub const PROTOCOL_VERSION: u32 = 1;

/// The only signature scheme the protocol accepts
pub const ALGORITHM_ED25519_SOLANA: &str = "ed25519-solana";

/// Errors raised while decoding or validating a challenge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("Challenge encoding error: {0}")]
    Codec(#[from] CodecError),

    #[error("Challenge JSON error: {0}")]
    Json(String),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Challenge field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("Challenge field '{field}' is not an RFC 3339 timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// Server-issued challenge.
///
/// `ts` and `exp` are kept as the exact strings that were issued so that
/// decoding and re-encoding never alters the signed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Challenge {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(rename = "alg")]
    pub algorithm: String,
    pub nonce: String,
    #[serde(rename = "ts")]
    pub issued_at: String,
    #[serde(rename = "aud")]
    pub audience: String,
    pub method: String,
    pub path: String,
    #[serde(rename = "uaBind")]
    pub user_agent_bound: bool,
    #[serde(rename = "originBind")]
    pub origin_bound: bool,
    #[serde(rename = "serverId")]
    pub server_id: String,
    #[serde(rename = "exp")]
    pub expires_at: String,
    #[serde(rename = "ext", default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<BTreeMap<String, Value>>,
}

impl Challenge {
    /// Canonical JSON of the whole challenge
    pub fn to_canonical_json(&self) -> Result<String, CodecError> {
        codec::to_canonical_string(self)
    }

    /// Base64url transport form (canonical JSON, unpadded)
    pub fn encode(&self) -> Result<String, CodecError> {
        Ok(codec::base64url_encode(self.to_canonical_json()?))
    }

    /// Decode a base64url challenge and validate every signed field
    pub fn decode(encoded: &str) -> Result<Self, ChallengeError> {
        let bytes = codec::base64url_decode(encoded)?;
        let challenge: Challenge =
            serde_json::from_slice(&bytes).map_err(|e| ChallengeError::Json(e.to_string()))?;
        challenge.validate()?;
        Ok(challenge)
    }

    /// Check version, algorithm, required text fields, and timestamps
    pub fn validate(&self) -> Result<(), ChallengeError> {
        if self.version != PROTOCOL_VERSION {
            return Err(ChallengeError::UnsupportedVersion(self.version));
        }
        if self.algorithm != ALGORITHM_ED25519_SOLANA {
            return Err(ChallengeError::UnsupportedAlgorithm(self.algorithm.clone()));
        }

        for (field, value) in [
            ("nonce", &self.nonce),
            ("aud", &self.audience),
            ("method", &self.method),
            ("path", &self.path),
            ("serverId", &self.server_id),
        ] {
            if value.is_empty() {
                return Err(ChallengeError::EmptyField(field));
            }
        }

        self.issued_at_time()?;
        self.expires_at_time()?;
        Ok(())
    }

    /// Parsed `ts`
    pub fn issued_at_time(&self) -> Result<DateTime<Utc>, ChallengeError> {
        parse_timestamp(&self.issued_at).map_err(|_| ChallengeError::InvalidTimestamp {
            field: "ts",
            value: self.issued_at.clone(),
        })
    }

    /// Parsed `exp`
    pub fn expires_at_time(&self) -> Result<DateTime<Utc>, ChallengeError> {
        parse_timestamp(&self.expires_at).map_err(|_| ChallengeError::InvalidTimestamp {
            field: "exp",
            value: self.expires_at.clone(),
        })
    }

    /// `METHOD:path` the challenge is scoped to
    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.method, self.path)
    }
}

/// Format a timestamp as ISO-8601 UTC, whole seconds, `Z` suffix
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse any RFC 3339 timestamp into UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|time| time.with_timezone(&Utc))
}
