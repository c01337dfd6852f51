/*
[INPUT]:  Raw bytes, transport strings, and JSON values
[OUTPUT]: base64url/base58 text, decoded bytes, canonical JSON
[POS]:    Codec layer - reversible encodings shared by client and server
[UPDATE]: When adding encodings or changing the canonical JSON contract
*/

pub mod base58;
pub mod base64url;
pub mod canonical_json;

use thiserror::Error;

pub use base58::{decode as base58_decode, decode_array as base58_decode_array, encode as base58_encode};
pub use base64url::{decode as base64url_decode, encode as base64url_encode};
pub use canonical_json::{canonicalize, to_canonical_string};

/// Errors raised while decoding transport encodings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input is not valid base64url (bad alphabet or truncated)
    #[error("Invalid base64url input: {0}")]
    Decode(String),

    /// Input contains a character outside the base58 alphabet
    #[error("Invalid base58 character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },

    /// Any other base58 failure
    #[error("Invalid base58 input: {0}")]
    Base58(String),

    /// Decoded value has the wrong byte length
    #[error("Expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Value could not be represented as JSON
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Json(e.to_string())
    }
}
