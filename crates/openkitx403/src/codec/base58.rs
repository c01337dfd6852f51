/*
[INPUT]:  Public keys, signatures, and nonces as raw bytes
[OUTPUT]: Base58 (Bitcoin/Solana alphabet) strings and decoded bytes
[POS]:    Codec layer - address and signature transport encoding
[UPDATE]: When changing base58 alphabet handling or error mapping
*/

use super::CodecError;

/// Encode bytes as base58. Leading zero bytes become leading `'1'`s.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a base58 string, restoring leading zero bytes.
pub fn decode(input: &str) -> Result<Vec<u8>, CodecError> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| map_error(input, e))
}

/// Decode a base58 string that must hold exactly `N` bytes.
pub fn decode_array<const N: usize>(input: &str) -> Result<[u8; N], CodecError> {
    let bytes = decode(input)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| CodecError::InvalidLength {
        expected: N,
        actual: bytes.len(),
    })
}

fn map_error(input: &str, error: bs58::decode::Error) -> CodecError {
    match error {
        bs58::decode::Error::InvalidCharacter { character, index } => {
            CodecError::InvalidCharacter { character, index }
        }
        bs58::decode::Error::NonAsciiCharacter { index } => CodecError::InvalidCharacter {
            character: input
                .get(index..)
                .and_then(|rest| rest.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
            index,
        },
        other => CodecError::Base58(other.to_string()),
    }
}
