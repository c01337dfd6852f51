/*
[INPUT]:  `Authorization` header text or signed proof fields
[OUTPUT]: AuthorizationProof values and their header encoding
[POS]:    Data layer - the client's answer to a challenge
[UPDATE]: When proof parameters or their header order change
*/

use std::fmt;
use std::str::FromStr;

use super::header::{AUTH_SCHEME, AuthParams, HeaderError};

/// Proof carried in `Authorization: OpenKitx403 ...` on the retried request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationProof {
    /// Base58 public key (`addr`)
    pub address: String,
    /// Base58 signature (`sig`)
    pub signature: String,
    /// Base64url challenge, echoed back unchanged
    pub challenge: String,
    /// Client signing time (`ts`)
    pub timestamp: String,
    /// Client nonce, base58 of 16 random bytes
    pub nonce: String,
    /// `METHOD:path` the proof authorizes; absent in some older clients
    pub bind: Option<String>,
}

impl AuthorizationProof {
    /// Parse an `Authorization` header value
    pub fn parse(header: &str) -> Result<Self, HeaderError> {
        let params = AuthParams::parse(header)?;
        Ok(Self {
            address: params.require("addr")?.to_string(),
            signature: params.require("sig")?.to_string(),
            challenge: params.require("challenge")?.to_string(),
            timestamp: params.require("ts")?.to_string(),
            nonce: params.require("nonce")?.to_string(),
            bind: params.get("bind").map(str::to_string),
        })
    }

    /// Render as an `Authorization` header value
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }
}

impl FromStr for AuthorizationProof {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AuthorizationProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{AUTH_SCHEME} addr=\"{}\", sig=\"{}\", challenge=\"{}\", ts=\"{}\", nonce=\"{}\"",
            self.address, self.signature, self.challenge, self.timestamp, self.nonce
        )?;
        if let Some(bind) = &self.bind {
            write!(f, ", bind=\"{bind}\"")?;
        }
        Ok(())
    }
}
