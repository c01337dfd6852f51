/*
[INPUT]:  Decoded Challenge
[OUTPUT]: The exact text both signer and verifier sign over
[POS]:    Auth layer - signing-string contract
[UPDATE]: When the signing-string layout or payload encoding changes
*/

use crate::codec::CodecError;
use crate::types::Challenge;

/// First line of every signing string
pub const SIGNING_STRING_TITLE: &str = "OpenKitx403 Challenge";

/// Build the signing string for a challenge.
///
/// ```text
/// OpenKitx403 Challenge
///
/// domain: <aud>
/// server: <serverId>
/// nonce: <nonce>
/// ts: <ts>
/// method: <method>
/// path: <path>
///
/// payload: <canonical JSON of the whole challenge>
/// ```
///
/// Lines are joined with `\n` and there is no trailing newline.
pub fn build_signing_string(challenge: &Challenge) -> Result<String, CodecError> {
    let payload = challenge.to_canonical_json()?;

    let lines = [
        SIGNING_STRING_TITLE.to_string(),
        String::new(),
        format!("domain: {}", challenge.audience),
        format!("server: {}", challenge.server_id),
        format!("nonce: {}", challenge.nonce),
        format!("ts: {}", challenge.issued_at),
        format!("method: {}", challenge.method),
        format!("path: {}", challenge.path),
        String::new(),
        format!("payload: {payload}"),
    ];
    Ok(lines.join("\n"))
}
