/*
[INPUT]:  Serialized challenge bytes or base64url text
[OUTPUT]: Unpadded base64url strings and decoded bytes
[POS]:    Codec layer - challenge transport encoding
[UPDATE]: When changing padding rules or accepted alphabets
*/

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};

use super::CodecError;

/// Encode bytes as base64url without padding.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url, reconstructing any stripped `=` padding first.
pub fn decode(input: &str) -> Result<Vec<u8>, CodecError> {
    let unpadded = input.trim_end_matches('=');
    let padding = (4 - unpadded.len() % 4) % 4;

    let mut padded = String::with_capacity(unpadded.len() + padding);
    padded.push_str(unpadded);
    padded.extend(std::iter::repeat_n('=', padding));

    URL_SAFE
        .decode(padded)
        .map_err(|e| CodecError::Decode(e.to_string()))
}
