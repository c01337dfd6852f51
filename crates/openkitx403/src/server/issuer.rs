/*
[INPUT]:  AuthConfig and the method/path of an unauthenticated request
[OUTPUT]: Fresh challenges and their WWW-Authenticate header value
[POS]:    Server layer - first half of the exchange
[UPDATE]: When challenge contents or nonce size change
*/

use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::codec::{self, CodecError};
use crate::server::AuthConfig;
use crate::types::{
    ALGORITHM_ED25519_SOLANA, Challenge, PROTOCOL_VERSION, format_timestamp, www_authenticate_value,
};

/// Random bytes behind each challenge nonce
pub const CHALLENGE_NONCE_BYTES: usize = 32;

/// Creates challenges scoped to this server's audience and issuer id
#[derive(Debug, Clone)]
pub struct ChallengeIssuer {
    config: AuthConfig,
}

impl ChallengeIssuer {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Challenge for `method path`, valid from now for `ttl_seconds`
    pub fn issue(&self, method: &str, path: &str) -> Challenge {
        self.issue_at(method, path, Utc::now())
    }

    pub fn issue_at(&self, method: &str, path: &str, now: DateTime<Utc>) -> Challenge {
        let mut nonce = [0u8; CHALLENGE_NONCE_BYTES];
        OsRng.fill_bytes(&mut nonce);

        Challenge {
            version: PROTOCOL_VERSION,
            algorithm: ALGORITHM_ED25519_SOLANA.to_string(),
            nonce: codec::base58_encode(nonce),
            issued_at: format_timestamp(now),
            audience: self.config.audience.clone(),
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            user_agent_bound: false,
            origin_bound: false,
            server_id: self.config.issuer.clone(),
            expires_at: format_timestamp(now + self.config.ttl()),
            extensions: None,
        }
    }

    /// `OpenKitx403 challenge="<base64url>"`
    pub fn www_authenticate(&self, challenge: &Challenge) -> Result<String, CodecError> {
        Ok(www_authenticate_value(&challenge.encode()?))
    }
}
