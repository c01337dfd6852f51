/*
[INPUT]:  Message bytes and secret key material (seed, keypair, or base58)
[OUTPUT]: Ed25519 signatures and base58-encoded public keys
[POS]:    Auth layer - in-process wallet used by the client and CLI
[UPDATE]: When changing signing algorithm or key format
*/

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::rngs::OsRng;

use crate::codec;
use crate::http::{ClientError, Result};

use super::wallet::WalletSigner;

/// Ed25519 signer holding its keypair in memory
#[derive(Debug, Clone)]
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create signer from existing secret key bytes (32-byte seed)
    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        Self { signing_key }
    }

    /// Create signer from a 32-byte seed or a 64-byte `seed || public key`
    /// keypair. The public half of a 64-byte keypair must match the seed.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(bytes);
                Ok(Self::from_secret_key(&seed))
            }
            64 => {
                let mut keypair = [0u8; 64];
                keypair.copy_from_slice(bytes);
                let signing_key = SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|e| ClientError::Config(format!("Invalid keypair bytes: {e}")))?;
                Ok(Self { signing_key })
            }
            other => Err(ClientError::Config(format!(
                "Invalid private key length: expected 32 or 64 bytes, got {other}"
            ))),
        }
    }

    /// Create signer from a base58-encoded seed or keypair
    pub fn from_base58(private_key: &str) -> Result<Self> {
        let bytes = codec::base58_decode(private_key.trim())
            .map_err(|e| ClientError::Config(format!("Invalid base58 private key: {e}")))?;
        Self::from_keypair_bytes(&bytes)
    }

    /// Sign a message and return the signature
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Get the public key in base58 encoding (the wallet address)
    pub fn public_key_base58(&self) -> String {
        codec::base58_encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Get the raw secret key bytes
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// `seed || public key`, the layout Solana keypair files use
    pub fn keypair_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    /// Verify a signature against a message
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify_strict(message, signature)
            .is_ok()
    }
}

#[async_trait]
impl WalletSigner for Ed25519Signer {
    fn public_key_bytes(&self) -> [u8; 32] {
        Ed25519Signer::public_key_bytes(self)
    }

    fn address(&self) -> String {
        self.public_key_base58()
    }

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(Ed25519Signer::sign(self, message).to_bytes().to_vec())
    }
}
