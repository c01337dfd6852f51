/*
[INPUT]:  Fixture challenges, signers, and replay stores
[OUTPUT]: Test results for the server-side verification flow
[POS]:    Integration tests - authenticator and replay defense
[UPDATE]: When verification rules or replay semantics change
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{at, fixture_challenge, fixture_config, sign_proof, test_signer};
use openkitx403::server::ReplayStoreError;
use openkitx403::{
    AuthError, Authenticator, Challenge, Ed25519Signer, ReplayStore, build_signing_string,
};
use tokio::sync::Barrier;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_fixture_scenario_accept_then_replay() {
    let auth = assert_ok!(Authenticator::with_in_memory_store(fixture_config()));
    let signer = test_signer();
    let proof = sign_proof(
        &signer,
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("GET:/api/nfts"),
    );
    let header = proof.to_header_value();
    let now = at("2024-01-01T00:00:05Z");

    let user = assert_ok!(auth.verify_at(Some(&header), "GET", "/api/nfts", now).await);
    assert_eq!(user.address, signer.public_key_base58());
    assert_eq!(user.challenge.nonce, "abc123");

    let err = auth
        .verify_at(Some(&header), "GET", "/api/nfts", now)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::ReplayDetected);
    assert_eq!(err.http_status().as_u16(), 401);
}

#[tokio::test]
async fn test_valid_signature_after_expiry_rejected() {
    let auth = assert_ok!(Authenticator::with_in_memory_store(fixture_config()));
    let proof = sign_proof(
        &test_signer(),
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("GET:/api/nfts"),
    );

    let err = auth
        .verify_at(
            Some(&proof.to_header_value()),
            "GET",
            "/api/nfts",
            at("2024-01-01T00:01:31Z"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ExpiredChallenge(_)));
    assert_eq!(err.http_status().as_u16(), 403);
}

#[tokio::test]
async fn test_wrong_bind_rejected() {
    let auth = assert_ok!(Authenticator::with_in_memory_store(fixture_config()));
    let proof = sign_proof(
        &test_signer(),
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("POST:/api/nfts"),
    );

    let err = auth
        .verify_at(
            Some(&proof.to_header_value()),
            "GET",
            "/api/nfts",
            at("2024-01-01T00:00:05Z"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::BindMismatch(_)));
}

#[tokio::test]
async fn test_other_keypair_rejected() {
    let auth = assert_ok!(Authenticator::with_in_memory_store(fixture_config()));
    let claimed = test_signer();
    let actual = Ed25519Signer::from_secret_key(&[42u8; 32]);

    let mut proof = sign_proof(
        &actual,
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("GET:/api/nfts"),
    );
    proof.address = claimed.public_key_base58();

    let err = auth
        .verify_at(
            Some(&proof.to_header_value()),
            "GET",
            "/api/nfts",
            at("2024-01-01T00:00:05Z"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSignature(_)));
}

#[tokio::test]
async fn test_tampered_challenge_rejected() {
    let auth = assert_ok!(Authenticator::with_in_memory_store(fixture_config()));
    let signer = test_signer();
    let mut proof = sign_proof(
        &signer,
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("GET:/api/nfts"),
    );

    let mut tampered = fixture_challenge();
    tampered.nonce = "abc124".to_string();
    proof.challenge = assert_ok!(tampered.encode());

    let err = auth
        .verify_at(
            Some(&proof.to_header_value()),
            "GET",
            "/api/nfts",
            at("2024-01-01T00:00:05Z"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSignature(_)));
}

#[tokio::test]
async fn test_signed_binding_flags_fail_closed() {
    let auth = assert_ok!(Authenticator::with_in_memory_store(fixture_config()));
    let signer = test_signer();

    for (ua_bound, origin_bound) in [(true, true), (true, false), (false, true)] {
        let mut challenge = fixture_challenge();
        challenge.user_agent_bound = ua_bound;
        challenge.origin_bound = origin_bound;
        let proof = sign_proof(&signer, &challenge, "2024-01-01T00:00:05Z", Some("GET:/api/nfts"));

        let err = auth
            .verify_at(
                Some(&proof.to_header_value()),
                "GET",
                "/api/nfts",
                at("2024-01-01T00:00:05Z"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidChallenge(_)), "{err:?}");
        assert_eq!(err.http_status().as_u16(), 403);
    }

    // The nonce was never consumed, so the unbound challenge still passes
    let proof = sign_proof(
        &signer,
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("GET:/api/nfts"),
    );
    assert_ok!(
        auth.verify_at(
            Some(&proof.to_header_value()),
            "GET",
            "/api/nfts",
            at("2024-01-01T00:00:05Z"),
        )
        .await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_presentations_accept_once() {
    let auth = Arc::new(assert_ok!(Authenticator::with_in_memory_store(
        fixture_config()
    )));
    let header = sign_proof(
        &test_signer(),
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("GET:/api/nfts"),
    )
    .to_header_value();
    let now = at("2024-01-01T00:00:05Z");

    let barrier = Arc::new(Barrier::new(50));
    let mut handles = Vec::new();
    for _ in 0..50 {
        let auth = Arc::clone(&auth);
        let barrier = Arc::clone(&barrier);
        let header = header.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            auth.verify_at(Some(&header), "GET", "/api/nfts", now).await
        }));
    }

    let mut accepted = 0;
    let mut replayed = 0;
    for handle in handles {
        match assert_ok!(handle.await) {
            Ok(_) => accepted += 1,
            Err(AuthError::ReplayDetected) => replayed += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(replayed, 49);
}

#[test]
fn test_signing_string_stable_across_transport() {
    let mut challenge = fixture_challenge();
    challenge.extensions = Some(
        [
            ("scope".to_string(), serde_json::json!(["nfts:read"])),
            ("price".to_string(), serde_json::json!(0.1)),
        ]
        .into_iter()
        .collect(),
    );

    let decoded = assert_ok!(Challenge::decode(&assert_ok!(challenge.encode())));
    assert_eq!(
        assert_ok!(build_signing_string(&decoded)),
        assert_ok!(build_signing_string(&challenge))
    );
}

struct SlowStore;

#[async_trait]
impl ReplayStore for SlowStore {
    async fn check_and_insert(&self, _key: &str) -> Result<bool, ReplayStoreError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(true)
    }
}

struct BrokenStore;

#[async_trait]
impl ReplayStore for BrokenStore {
    async fn check_and_insert(&self, _key: &str) -> Result<bool, ReplayStoreError> {
        Err(ReplayStoreError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_store_failures_fail_closed() {
    let mut config = fixture_config();
    config.store_timeout_ms = 50;
    let header = sign_proof(
        &test_signer(),
        &fixture_challenge(),
        "2024-01-01T00:00:05Z",
        Some("GET:/api/nfts"),
    )
    .to_header_value();
    let now = at("2024-01-01T00:00:05Z");

    let slow = assert_ok!(Authenticator::new(config.clone(), Arc::new(SlowStore)));
    let err = slow
        .verify_at(Some(&header), "GET", "/api/nfts", now)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::StoreUnavailable(_)));
    assert_eq!(err.http_status().as_u16(), 401);

    let broken = assert_ok!(Authenticator::new(config, Arc::new(BrokenStore)));
    let err = broken
        .verify_at(Some(&header), "GET", "/api/nfts", now)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::StoreUnavailable(_)));
}
