/*
[INPUT]:  Protocol schema (challenge fields, header grammar)
[OUTPUT]: Typed challenge, proof, and header helpers
[POS]:    Data layer - wire types shared by client and server
[UPDATE]: When the wire format changes
*/

pub mod challenge;
pub mod header;
pub mod proof;

pub use challenge::{
    ALGORITHM_ED25519_SOLANA, Challenge, ChallengeError, PROTOCOL_VERSION, format_timestamp,
    parse_timestamp,
};
pub use header::{AUTH_SCHEME, AuthParams, HeaderError, parse_www_authenticate, www_authenticate_value};
pub use proof::AuthorizationProof;
