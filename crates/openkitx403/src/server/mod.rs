/*
[INPUT]:  AuthConfig, replay store, incoming requests
[OUTPUT]: Issued challenges, verified principals, axum middleware
[POS]:    Server layer - issuing and verifying OpenKitx403 proofs
[UPDATE]: When verification flow or server integration changes
*/

pub mod config;
pub mod error;
pub mod issuer;
pub mod middleware;
pub mod replay;
pub mod verifier;

pub use config::{AuthConfig, ConfigError, MAX_WINDOW_SECONDS};
pub use error::AuthError;
pub use issuer::{CHALLENGE_NONCE_BYTES, ChallengeIssuer};
pub use middleware::{challenge_response, openkit_middleware, unauthorized_response};
pub use replay::{InMemoryReplayStore, ReplayRecord, ReplayStore, ReplayStoreError, replay_key};
pub use verifier::{Authenticator, OpenKitUser};
