/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public OpenKitx403 crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod codec;
pub mod http;
pub mod server;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    Ed25519Signer,
    KeypairFile,
    MockWalletSigner,
    WalletSigner,
    build_signing_string,
};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    ClientError,
    OpenKitClient,
    Result,
};

// Re-export commonly used types from server
pub use server::{
    AuthConfig,
    AuthError,
    Authenticator,
    ChallengeIssuer,
    InMemoryReplayStore,
    OpenKitUser,
    ReplayStore,
    openkit_middleware,
};

pub use codec::CodecError;

// Re-export all types
pub use types::*;
