// src/auth.rs
//! Company token checks and JWT payload inspection

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Serialize;
use tracing::warn;

/// Decoder with `atob` semantics: padding optional, trailing bits ignored.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

fn forgiving_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    FORGIVING.decode(compact)
}

/// True when `input` is present, non-empty and decodes as standard base64.
pub fn is_valid_base64<S: AsRef<str>>(input: Option<S>) -> bool {
    match input {
        Some(s) if !s.as_ref().is_empty() => forgiving_decode(s.as_ref()).is_ok(),
        _ => false,
    }
}

/// Structural check applied to a stored company token at startup.
///
/// Only the second segment's decodability is checked; the payload is
/// never parsed here.
pub fn is_structurally_valid_token(token: &str) -> bool {
    !token.is_empty() && token.contains('.') && is_valid_base64(token.split('.').nth(1))
}

/// Decode the payload segment of a JWT-shaped token.
///
/// URL-safe characters are normalized before decoding. Any failure is
/// logged and yields `None`.
pub fn parse_jwt(token: &str) -> Option<serde_json::Value> {
    let result = token
        .split('.')
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Token has no payload segment"))
        .and_then(|segment| {
            let normalized = segment.replace('-', "+").replace('_', "/");
            forgiving_decode(&normalized).map_err(anyhow::Error::from)
        })
        .and_then(|bytes| String::from_utf8(bytes).map_err(anyhow::Error::from))
        .and_then(|text| {
            serde_json::from_str::<serde_json::Value>(&text).map_err(anyhow::Error::from)
        });

    match result {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!("Invalid token payload: {}", e);
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenReport {
    pub structurally_valid: bool,
    pub algorithm: Option<String>,
    pub key_id: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Everything that can be learned about a token without a verification key
pub fn inspect_token(token: &str) -> TokenReport {
    let header = jsonwebtoken::decode_header(token).ok();

    TokenReport {
        structurally_valid: is_structurally_valid_token(token),
        algorithm: header.as_ref().map(|h| format!("{:?}", h.alg)),
        key_id: header.and_then(|h| h.kid),
        payload: parse_jwt(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_base64() {
        assert!(!is_valid_base64(None::<&str>));
        assert!(!is_valid_base64(Some("")));
        assert!(!is_valid_base64(Some("not base64!!")));
        assert!(is_valid_base64(Some("aGVsbG8=")));
        assert!(is_valid_base64(Some("aGVsbG8")));
        assert!(is_valid_base64(Some("def")));
    }

    #[test]
    fn test_is_valid_base64_rejects_url_safe_alphabet() {
        assert!(!is_valid_base64(Some("ab-_")));
        assert!(!is_valid_base64(Some("%%%")));
        assert!(!is_valid_base64(Some("a")));
    }

    #[test]
    fn test_is_structurally_valid_token() {
        assert!(is_structurally_valid_token("abc.def"));
        assert!(is_structurally_valid_token("abc.def.ghi"));
        assert!(!is_structurally_valid_token("not-a-jwt"));
        assert!(!is_structurally_valid_token("abc.%%%"));
        assert!(!is_structurally_valid_token("abc."));
        assert!(!is_structurally_valid_token(""));
    }

    #[test]
    fn test_parse_jwt() {
        // {"id":"42"}
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJpZCI6IjQyIn0.c2ln";
        let payload = parse_jwt(token).unwrap();
        assert_eq!(payload["id"], "42");

        assert!(parse_jwt("no-dots").is_none());
        assert!(parse_jwt("abc.aGVsbG8=").is_none());
    }

    #[test]
    fn test_parse_jwt_normalizes_url_safe_characters() {
        // {"k":"??>"} encodes to eyJrIjoiPz8-In0 in the URL-safe alphabet
        let payload = parse_jwt("h.eyJrIjoiPz8-In0.s").unwrap();
        assert_eq!(payload["k"], "??>");
    }

    #[test]
    fn test_inspect_token() {
        let report = inspect_token("eyJhbGciOiJIUzI1NiJ9.eyJpZCI6IjQyIn0.c2ln");
        assert!(report.structurally_valid);
        assert_eq!(report.algorithm.as_deref(), Some("HS256"));
        assert_eq!(report.payload.unwrap()["id"], "42");

        let report = inspect_token("garbage");
        assert!(!report.structurally_valid);
        assert!(report.algorithm.is_none());
        assert!(report.payload.is_none());
    }
}
