/*
[INPUT]:  Test configuration and fixture requirements
[OUTPUT]: Shared test utilities, fixtures, and proof helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for openkitx403 tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use openkitx403::codec;
use openkitx403::{
    ALGORITHM_ED25519_SOLANA, AuthConfig, AuthorizationProof, Challenge, Ed25519Signer,
    PROTOCOL_VERSION, build_signing_string, parse_timestamp,
};
use wiremock::MockServer;

pub const AUDIENCE: &str = "https://api.example";
pub const SERVER_ID: &str = "srv1";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Deterministic signer for testing
pub fn test_signer() -> Ed25519Signer {
    Ed25519Signer::from_secret_key(&[1u8; 32])
}

/// Config matching `fixture_challenge`
pub fn fixture_config() -> AuthConfig {
    AuthConfig::new(AUDIENCE, SERVER_ID)
}

/// `GET /api/nfts`, nonce `abc123`, valid 2024-01-01T00:00:00Z..00:01:00Z
pub fn fixture_challenge() -> Challenge {
    Challenge {
        version: PROTOCOL_VERSION,
        algorithm: ALGORITHM_ED25519_SOLANA.to_string(),
        nonce: "abc123".to_string(),
        issued_at: "2024-01-01T00:00:00Z".to_string(),
        audience: AUDIENCE.to_string(),
        method: "GET".to_string(),
        path: "/api/nfts".to_string(),
        user_agent_bound: false,
        origin_bound: false,
        server_id: SERVER_ID.to_string(),
        expires_at: "2024-01-01T00:01:00Z".to_string(),
        extensions: None,
    }
}

pub fn at(timestamp: &str) -> DateTime<Utc> {
    parse_timestamp(timestamp).unwrap()
}

/// Sign `challenge` the way a client would, with an explicit proof time
pub fn sign_proof(
    signer: &Ed25519Signer,
    challenge: &Challenge,
    signed_at: &str,
    bind: Option<&str>,
) -> AuthorizationProof {
    let signing_string = build_signing_string(challenge).unwrap();
    let signature = signer.sign(signing_string.as_bytes());

    AuthorizationProof {
        address: signer.public_key_base58(),
        signature: codec::base58_encode(signature.to_bytes()),
        challenge: challenge.encode().unwrap(),
        timestamp: signed_at.to_string(),
        nonce: codec::base58_encode([7u8; 16]),
        bind: bind.map(str::to_string),
    }
}
