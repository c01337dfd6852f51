/*
[INPUT]:  Bytes to sign and a wallet's private key (held by the implementor)
[OUTPUT]: Raw Ed25519 signature bytes and the wallet's base58 address
[POS]:    Auth layer - wallet integration abstraction
[UPDATE]: When adding new wallet types or changing signature format
*/

use async_trait::async_trait;

use crate::codec;
use crate::http::Result;

/// Trait for wallet signing operations
///
/// Implement this trait for your wallet type. The trait is async so that
/// hardware wallets and remote signers fit behind the same interface.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Raw 32-byte Ed25519 public key
    fn public_key_bytes(&self) -> [u8; 32];

    /// Wallet address (base58 public key)
    fn address(&self) -> String {
        codec::base58_encode(self.public_key_bytes())
    }

    /// Sign a message and return the 64-byte signature
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Mock wallet signer for testing
#[derive(Debug, Clone)]
pub struct MockWalletSigner {
    public_key: [u8; 32],
    signature: Vec<u8>,
}

impl MockWalletSigner {
    /// Create a new mock signer with a predetermined signature
    pub fn new(public_key: [u8; 32], signature: Vec<u8>) -> Self {
        Self {
            public_key,
            signature,
        }
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn public_key_bytes(&self) -> [u8; 32] {
        self.public_key
    }

    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signature.clone())
    }
}
