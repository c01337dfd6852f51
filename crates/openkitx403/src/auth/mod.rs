/*
[INPUT]:  Challenges to sign and wallet key material
[OUTPUT]: Signing strings, Ed25519 signers, and keypair files
[POS]:    Auth layer - everything that produces or describes a signature
[UPDATE]: When the signing contract or supported key sources change
*/

pub mod keypair_file;
pub mod signer;
pub mod signing;
pub mod wallet;

pub use keypair_file::KeypairFile;
pub use signer::Ed25519Signer;
pub use signing::{SIGNING_STRING_TITLE, build_signing_string};
pub use wallet::{MockWalletSigner, WalletSigner};
