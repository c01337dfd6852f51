/*
[INPUT]:  Path to a Solana-style keypair JSON file
[OUTPUT]: Ed25519Signer instances loaded from or saved to disk
[POS]:    Auth layer - persistent storage for wallet keypairs
[UPDATE]: When key storage format or file permissions change
*/

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::Ed25519Signer;
use crate::http::{ClientError, Result};

/// Accepted on-disk layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeypairJson {
    /// `[12, 34, ...]` as written by `solana-keygen`
    Bytes(Vec<u8>),
    /// `{"secretKey": [...]}` as exported by browser wallets
    Object {
        #[serde(rename = "secretKey")]
        secret_key: Vec<u8>,
    },
}

/// A keypair JSON file holding `seed || public key`
#[derive(Debug, Clone)]
pub struct KeypairFile {
    path: PathBuf,
}

impl KeypairFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a signer from the file
    pub fn load(&self) -> Result<Ed25519Signer> {
        let content = fs::read_to_string(&self.path)?;
        let parsed: KeypairJson = serde_json::from_str(content.trim()).map_err(|e| {
            ClientError::Config(format!(
                "Invalid keypair file {}: {e}",
                self.path.display()
            ))
        })?;

        let bytes = match parsed {
            KeypairJson::Bytes(bytes) => bytes,
            KeypairJson::Object { secret_key } => secret_key,
        };
        Ed25519Signer::from_keypair_bytes(&bytes)
    }

    /// Save a signer to the file, readable only by the owner
    pub fn save(&self, signer: &Ed25519Signer) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let encoded = serde_json::to_string(&signer.keypair_bytes().to_vec())?;
        fs::write(&self.path, encoded)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    /// Load the file, or generate and save a new keypair if it doesn't exist
    pub fn load_or_create(&self) -> Result<Ed25519Signer> {
        if self.path.exists() {
            self.load()
        } else {
            let signer = Ed25519Signer::generate();
            self.save(&signer)?;
            Ok(signer)
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
