/*
[INPUT]:  Authorization header, request method/path, AuthConfig, ReplayStore
[OUTPUT]: Verified OpenKitUser or a typed AuthError
[POS]:    Server layer - second half of the exchange
[UPDATE]: When verification steps or their order change
*/

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, VerifyingKey};
use tracing::{debug, warn};

use crate::auth::build_signing_string;
use crate::codec;
use crate::server::{
    AuthConfig, AuthError, ChallengeIssuer, ConfigError, InMemoryReplayStore, ReplayStore,
    replay_key,
};
use crate::types::{AuthorizationProof, Challenge, parse_timestamp};

/// Authenticated caller, handed to request handlers
#[derive(Debug, Clone, PartialEq)]
pub struct OpenKitUser {
    /// Base58 wallet address that signed the challenge
    pub address: String,
    /// The challenge the signature covers
    pub challenge: Challenge,
}

/// Verifies `Authorization: OpenKitx403 ...` proofs
pub struct Authenticator {
    config: AuthConfig,
    issuer: ChallengeIssuer,
    store: Arc<dyn ReplayStore>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(config: AuthConfig, store: Arc<dyn ReplayStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            issuer: ChallengeIssuer::new(config.clone()),
            config,
            store,
        })
    }

    /// Authenticator backed by an `InMemoryReplayStore` sized from the config
    pub fn with_in_memory_store(config: AuthConfig) -> Result<Self, ConfigError> {
        let store = InMemoryReplayStore::new(config.replay_ttl(), config.replay_capacity);
        Self::new(config, Arc::new(store))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn issuer(&self) -> &ChallengeIssuer {
        &self.issuer
    }

    /// Verify a request's `Authorization` header against the current time
    pub async fn verify(
        &self,
        header: Option<&str>,
        method: &str,
        path: &str,
    ) -> Result<OpenKitUser, AuthError> {
        self.verify_at(header, method, path, Utc::now()).await
    }

    /// Verify against an explicit clock reading
    pub async fn verify_at(
        &self,
        header: Option<&str>,
        method: &str,
        path: &str,
        now: DateTime<Utc>,
    ) -> Result<OpenKitUser, AuthError> {
        let result = self.run_checks(header, method, path, now).await;
        match &result {
            Ok(user) => {
                debug!(address = %user.address, method, path, "OpenKitx403 proof accepted");
            }
            Err(AuthError::MissingCredential) => {
                debug!(method, path, "no OpenKitx403 credential");
            }
            Err(err) => {
                warn!(kind = err.name(), reason = %err, method, path, "OpenKitx403 proof rejected");
            }
        }
        result
    }

    async fn run_checks(
        &self,
        header: Option<&str>,
        method: &str,
        path: &str,
        now: DateTime<Utc>,
    ) -> Result<OpenKitUser, AuthError> {
        let header = header.ok_or(AuthError::MissingCredential)?;

        let proof = parse_proof(header)?;
        let challenge = self.decode_challenge(&proof.challenge)?;

        self.check_freshness(&challenge, &proof, now)?;
        self.check_audience(&challenge)?;
        if self.config.bind_method_path {
            check_bind(&challenge, &proof, method, path)?;
        }
        verify_signature(&challenge, &proof)?;
        self.consume(&challenge).await?;

        Ok(OpenKitUser {
            address: proof.address,
            challenge,
        })
    }

    fn decode_challenge(&self, encoded: &str) -> Result<Challenge, AuthError> {
        let challenge =
            Challenge::decode(encoded).map_err(|e| AuthError::InvalidChallenge(e.to_string()))?;

        let issued_at = challenge
            .issued_at_time()
            .map_err(|e| AuthError::InvalidChallenge(e.to_string()))?;
        let expires_at = challenge
            .expires_at_time()
            .map_err(|e| AuthError::InvalidChallenge(e.to_string()))?;

        // No user-agent or origin is available here to check against
        if challenge.user_agent_bound || challenge.origin_bound {
            return Err(AuthError::InvalidChallenge(
                "uaBind/originBind requested but not enforceable".to_string(),
            ));
        }
        if expires_at < issued_at {
            return Err(AuthError::InvalidChallenge("exp precedes ts".to_string()));
        }
        if expires_at - issued_at > self.config.ttl() {
            return Err(AuthError::InvalidChallenge(format!(
                "lifetime exceeds {}s",
                self.config.ttl_seconds
            )));
        }
        Ok(challenge)
    }

    fn check_freshness(
        &self,
        challenge: &Challenge,
        proof: &AuthorizationProof,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let skew = self.config.clock_skew();
        let issued_at = challenge
            .issued_at_time()
            .map_err(|e| AuthError::InvalidChallenge(e.to_string()))?;
        let expires_at = challenge
            .expires_at_time()
            .map_err(|e| AuthError::InvalidChallenge(e.to_string()))?;
        let earliest = issued_at - skew;
        let latest = expires_at + skew;

        if now > latest {
            return Err(AuthError::ExpiredChallenge(format!(
                "now {now} is past exp {} plus skew",
                challenge.expires_at
            )));
        }
        if now < earliest {
            return Err(AuthError::ExpiredChallenge(format!(
                "now {now} is before ts {} minus skew",
                challenge.issued_at
            )));
        }

        let signed_at = parse_timestamp(&proof.timestamp)
            .map_err(|e| AuthError::MalformedProof(format!("ts: {e}")))?;
        if signed_at < earliest || signed_at > latest {
            return Err(AuthError::ExpiredChallenge(format!(
                "proof ts {} outside the challenge window",
                proof.timestamp
            )));
        }
        Ok(())
    }

    fn check_audience(&self, challenge: &Challenge) -> Result<(), AuthError> {
        if challenge.audience != self.config.audience {
            return Err(AuthError::AudienceMismatch(format!(
                "aud {} != {}",
                challenge.audience, self.config.audience
            )));
        }
        if challenge.server_id != self.config.issuer {
            return Err(AuthError::AudienceMismatch(format!(
                "serverId {} != {}",
                challenge.server_id, self.config.issuer
            )));
        }
        Ok(())
    }

    async fn consume(&self, challenge: &Challenge) -> Result<(), AuthError> {
        let key = replay_key(&challenge.audience, &challenge.server_id, &challenge.nonce);
        let timeout = self.config.store_timeout();

        match tokio::time::timeout(timeout, self.store.check_and_insert(&key)).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(AuthError::ReplayDetected),
            Ok(Err(e)) => Err(AuthError::StoreUnavailable(e.to_string())),
            Err(_) => Err(AuthError::StoreUnavailable(format!(
                "no answer within {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

/// Parse the header and the proof fields the header grammar leaves open
fn parse_proof(header: &str) -> Result<AuthorizationProof, AuthError> {
    let proof =
        AuthorizationProof::parse(header).map_err(|e| AuthError::MalformedProof(e.to_string()))?;

    parse_timestamp(&proof.timestamp)
        .map_err(|e| AuthError::MalformedProof(format!("ts: {e}")))?;
    match codec::base58_decode(&proof.nonce) {
        Ok(bytes) if !bytes.is_empty() => {}
        Ok(_) => return Err(AuthError::MalformedProof("nonce is empty".to_string())),
        Err(e) => return Err(AuthError::MalformedProof(format!("nonce: {e}"))),
    }
    Ok(proof)
}

fn check_bind(
    challenge: &Challenge,
    proof: &AuthorizationProof,
    method: &str,
    path: &str,
) -> Result<(), AuthError> {
    let bind = proof
        .bind
        .as_deref()
        .ok_or_else(|| AuthError::BindMismatch("bind missing".to_string()))?;

    let request_target = format!("{}:{path}", method.to_ascii_uppercase());
    if bind != request_target {
        return Err(AuthError::BindMismatch(format!(
            "bind {bind} != request {request_target}"
        )));
    }
    let challenge_target = challenge.bind_target();
    if bind != challenge_target {
        return Err(AuthError::BindMismatch(format!(
            "bind {bind} != challenge {challenge_target}"
        )));
    }
    Ok(())
}

fn verify_signature(challenge: &Challenge, proof: &AuthorizationProof) -> Result<(), AuthError> {
    let public_key: [u8; 32] = codec::base58_decode_array(&proof.address)
        .map_err(|e| AuthError::InvalidSignature(format!("addr: {e}")))?;
    let verifying_key = VerifyingKey::from_bytes(&public_key)
        .map_err(|e| AuthError::InvalidSignature(format!("addr: {e}")))?;

    let signature: [u8; 64] = codec::base58_decode_array(&proof.signature)
        .map_err(|e| AuthError::InvalidSignature(format!("sig: {e}")))?;
    let signature = Signature::from_bytes(&signature);

    let signing_string =
        build_signing_string(challenge).map_err(|e| AuthError::InvalidChallenge(e.to_string()))?;

    verifying_key
        .verify_strict(signing_string.as_bytes(), &signature)
        .map_err(|e| AuthError::InvalidSignature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Ed25519Signer;
    use crate::types::format_timestamp;
    use chrono::{Duration, TimeZone};

    fn config() -> AuthConfig {
        AuthConfig::new("https://api.example", "srv1")
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn signed_header(
        signer: &Ed25519Signer,
        challenge: &Challenge,
        signed_at: DateTime<Utc>,
        bind: Option<&str>,
    ) -> String {
        let signing_string = build_signing_string(challenge).unwrap();
        AuthorizationProof {
            address: signer.public_key_base58(),
            signature: codec::base58_encode(signer.sign(signing_string.as_bytes()).to_bytes()),
            challenge: challenge.encode().unwrap(),
            timestamp: format_timestamp(signed_at),
            nonce: codec::base58_encode([5u8; 16]),
            bind: bind.map(str::to_string),
        }
        .to_header_value()
    }

    #[tokio::test]
    async fn test_accepts_then_detects_replay() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        let signer = Ed25519Signer::from_secret_key(&[1u8; 32]);
        let challenge = auth.issuer().issue_at("GET", "/api/nfts", noon());
        let header = signed_header(&signer, &challenge, noon(), Some("GET:/api/nfts"));

        let user = auth
            .verify_at(Some(&header), "GET", "/api/nfts", noon())
            .await
            .unwrap();
        assert_eq!(user.address, signer.public_key_base58());
        assert_eq!(user.challenge, challenge);

        let err = auth
            .verify_at(Some(&header), "GET", "/api/nfts", noon())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::ReplayDetected);
    }

    #[tokio::test]
    async fn test_missing_header() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        assert_eq!(
            auth.verify(None, "GET", "/").await.unwrap_err(),
            AuthError::MissingCredential
        );
    }

    #[tokio::test]
    async fn test_skew_boundaries() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        let signer = Ed25519Signer::generate();

        let challenge = auth.issuer().issue_at("GET", "/a", noon());
        let header = signed_header(&signer, &challenge, noon(), Some("GET:/a"));
        let last_valid = noon() + Duration::seconds(60 + 30);
        assert!(auth.verify_at(Some(&header), "GET", "/a", last_valid).await.is_ok());

        let challenge = auth.issuer().issue_at("GET", "/a", noon());
        let header = signed_header(&signer, &challenge, noon(), Some("GET:/a"));
        let too_late = last_valid + Duration::seconds(1);
        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", too_late).await,
            Err(AuthError::ExpiredChallenge(_))
        ));

        let too_early = noon() - Duration::seconds(31);
        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", too_early).await,
            Err(AuthError::ExpiredChallenge(_))
        ));
    }

    #[tokio::test]
    async fn test_proof_timestamp_outside_window() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        let signer = Ed25519Signer::generate();
        let challenge = auth.issuer().issue_at("GET", "/a", noon());
        let header = signed_header(
            &signer,
            &challenge,
            noon() - Duration::minutes(5),
            Some("GET:/a"),
        );

        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", noon()).await,
            Err(AuthError::ExpiredChallenge(_))
        ));
    }

    #[tokio::test]
    async fn test_overlong_challenge_lifetime_rejected() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        let signer = Ed25519Signer::generate();
        let mut challenge = auth.issuer().issue_at("GET", "/a", noon());
        challenge.expires_at = format_timestamp(noon() + Duration::hours(1));
        let header = signed_header(&signer, &challenge, noon(), Some("GET:/a"));

        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", noon()).await,
            Err(AuthError::InvalidChallenge(_))
        ));

        challenge.expires_at = format_timestamp(noon() - Duration::seconds(1));
        let header = signed_header(&signer, &challenge, noon(), Some("GET:/a"));
        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", noon()).await,
            Err(AuthError::InvalidChallenge(_))
        ));
    }

    #[tokio::test]
    async fn test_audience_and_issuer_must_match() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        let signer = Ed25519Signer::generate();

        let foreign = ChallengeIssuer::new(AuthConfig::new("https://evil.example", "srv1"))
            .issue_at("GET", "/a", noon());
        let header = signed_header(&signer, &foreign, noon(), Some("GET:/a"));
        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", noon()).await,
            Err(AuthError::AudienceMismatch(_))
        ));

        let other_server = ChallengeIssuer::new(AuthConfig::new("https://api.example", "srv2"))
            .issue_at("GET", "/a", noon());
        let header = signed_header(&signer, &other_server, noon(), Some("GET:/a"));
        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", noon()).await,
            Err(AuthError::AudienceMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_rules() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        let signer = Ed25519Signer::generate();

        let challenge = auth.issuer().issue_at("GET", "/a", noon());
        let header = signed_header(&signer, &challenge, noon(), None);
        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/a", noon()).await,
            Err(AuthError::BindMismatch(_))
        ));

        let header = signed_header(&signer, &challenge, noon(), Some("GET:/a"));
        assert!(matches!(
            auth.verify_at(Some(&header), "POST", "/a", noon()).await,
            Err(AuthError::BindMismatch(_))
        ));

        let header = signed_header(&signer, &challenge, noon(), Some("GET:/b"));
        assert!(matches!(
            auth.verify_at(Some(&header), "GET", "/b", noon()).await,
            Err(AuthError::BindMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_disabled_accepts_any_bind() {
        let mut config = config();
        config.bind_method_path = false;
        let auth = Authenticator::with_in_memory_store(config).unwrap();
        let signer = Ed25519Signer::generate();

        let challenge = auth.issuer().issue_at("GET", "/a", noon());
        let header = signed_header(&signer, &challenge, noon(), Some("DELETE:/z"));
        assert!(auth.verify_at(Some(&header), "GET", "/other", noon()).await.is_ok());
    }

    #[tokio::test]
    async fn test_signature_by_other_key_rejected() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();
        let signer = Ed25519Signer::from_secret_key(&[1u8; 32]);
        let impostor = Ed25519Signer::from_secret_key(&[2u8; 32]);
        let challenge = auth.issuer().issue_at("GET", "/a", noon());

        let header = signed_header(&impostor, &challenge, noon(), Some("GET:/a"));
        let mut proof = AuthorizationProof::parse(&header).unwrap();
        proof.address = signer.public_key_base58();

        assert!(matches!(
            auth.verify_at(Some(&proof.to_header_value()), "GET", "/a", noon())
                .await,
            Err(AuthError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_inputs() {
        let auth = Authenticator::with_in_memory_store(config()).unwrap();

        for header in [
            "Bearer abc",
            r#"OpenKitx403 addr="a", sig="s", challenge="c", ts="t""#,
            r#"OpenKitx403 addr="a", sig="s", challenge="c", ts="not-a-time", nonce="abc""#,
            r#"OpenKitx403 addr="a", sig="s", challenge="c", ts="2024-01-01T12:00:00Z", nonce="0OIl""#,
        ] {
            assert!(
                matches!(
                    auth.verify_at(Some(header), "GET", "/", noon()).await,
                    Err(AuthError::MalformedProof(_))
                ),
                "header: {header}"
            );
        }

        let header = r#"OpenKitx403 addr="a", sig="s", challenge="!!", ts="2024-01-01T12:00:00Z", nonce="abc""#;
        assert!(matches!(
            auth.verify_at(Some(header), "GET", "/", noon()).await,
            Err(AuthError::InvalidChallenge(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = config();
        config.replay_capacity = 0;
        assert!(Authenticator::with_in_memory_store(config).is_err());
    }
}
