/*
[INPUT]:  Raw `WWW-Authenticate` / `Authorization` header values
[OUTPUT]: Scheme-checked `key="value"` parameter lists
[POS]:    Data layer - shared HTTP auth header grammar
[UPDATE]: When the auth scheme name or parameter syntax changes
*/

use thiserror::Error;

/// HTTP authentication scheme name
pub const AUTH_SCHEME: &str = "OpenKitx403";

/// Errors raised while parsing an OpenKitx403 auth header
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Expected the OpenKitx403 auth scheme")]
    WrongScheme,

    #[error("Malformed parameter near byte {0}")]
    Malformed(usize),

    #[error("Unterminated quoted value for '{0}'")]
    Unterminated(String),

    #[error("Duplicate parameter '{0}'")]
    Duplicate(String),

    #[error("Missing parameter '{0}'")]
    Missing(&'static str),
}

/// Parsed `key="value"` parameters in header order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthParams<'a> {
    params: Vec<(&'a str, &'a str)>,
}

impl<'a> AuthParams<'a> {
    /// Parse `OpenKitx403 k1="v1", k2="v2"`. The scheme matches
    /// case-insensitively; values may not contain `"`.
    pub fn parse(header: &'a str) -> Result<Self, HeaderError> {
        let header = header.trim();
        let (scheme, rest) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
        if !scheme.eq_ignore_ascii_case(AUTH_SCHEME) {
            return Err(HeaderError::WrongScheme);
        }

        let mut params: Vec<(&str, &str)> = Vec::new();
        let mut rest = rest;

        loop {
            rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
            if rest.is_empty() {
                break;
            }
            let offset = header.len() - rest.len();

            let (key, after_key) = rest.split_once('=').ok_or(HeaderError::Malformed(offset))?;
            let key = key.trim_end();
            if key.is_empty()
                || !key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(HeaderError::Malformed(offset));
            }

            let quoted = after_key
                .trim_start()
                .strip_prefix('"')
                .ok_or(HeaderError::Malformed(offset))?;
            let (value, after_value) = quoted
                .split_once('"')
                .ok_or_else(|| HeaderError::Unterminated(key.to_string()))?;

            if !(after_value.is_empty()
                || after_value.starts_with(',')
                || after_value.starts_with(char::is_whitespace))
            {
                return Err(HeaderError::Malformed(offset));
            }
            if params.iter().any(|(existing, _)| *existing == key) {
                return Err(HeaderError::Duplicate(key.to_string()));
            }

            params.push((key, value));
            rest = after_value;
        }

        Ok(Self { params })
    }

    /// Value of an optional parameter
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }

    /// Value of a required parameter
    pub fn require(&self, key: &'static str) -> Result<&'a str, HeaderError> {
        self.get(key).ok_or(HeaderError::Missing(key))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// `WWW-Authenticate` value carrying an encoded challenge
pub fn www_authenticate_value(encoded_challenge: &str) -> String {
    format!("{AUTH_SCHEME} challenge=\"{encoded_challenge}\"")
}

/// Extract the encoded challenge from a `WWW-Authenticate` value
pub fn parse_www_authenticate(header: &str) -> Result<&str, HeaderError> {
    AuthParams::parse(header)?.require("challenge")
}
