//! Administrator bearer tokens.
//!
//! Tokens use the compact HS256 layout:
//!
//! ```text
//! Authorization: Bearer {base64url(header)}.{base64url(claims)}.{base64url(signature)}
//! ```
//!
//! where `signature = HMAC-SHA256("{header}.{claims}", secret)` over the two
//! encoded segments. Tokens are issued by the login service; the raffle
//! server only verifies them.

use serde::{Deserialize, Serialize};

/// Prefix of the `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// The only accepted signing algorithm.
pub const TOKEN_ALGORITHM: &str = "HS256";

/// Claims carried by an administrator token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Administrator id.
    pub id: i64,
    /// Administrator role, e.g. `master` or `admin`.
    pub rol: String,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

/// Errors produced by token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
}

impl From<ring::error::Unspecified> for TokenError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn hmac_key(key: &[u8]) -> ring::hmac::Key {
    ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key)
}

fn encode_segment(bytes: &[u8]) -> String {
    fast32::base64::RFC4648_URL_NOPAD.encode(bytes)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    fast32::base64::RFC4648_URL_NOPAD
        .decode_str(segment)
        .map_err(|_| TokenError::InvalidBase64)
}

/// Sign `claims` with `key` and return the compact token.
pub fn sign_token(claims: &AdminClaims, key: &[u8]) -> Result<String, TokenError> {
    let header = TokenHeader {
        alg: TOKEN_ALGORITHM.to_owned(),
        typ: Some("JWT".to_owned()),
    };
    let header = encode_segment(serde_json::to_string(&header)?.as_bytes());
    let claims = encode_segment(serde_json::to_string(claims)?.as_bytes());
    let signing_input = format!("{header}.{claims}");
    let signature = ring::hmac::sign(&hmac_key(key), signing_input.as_bytes());
    Ok(format!("{signing_input}.{}", encode_segment(signature.as_ref())))
}

/// Verify a compact token against `key` and the current time.
pub fn verify_token(token: &str, key: &[u8]) -> Result<AdminClaims, TokenError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    verify_token_at(token, key, now)
}

/// Verify a compact token against `key`, treating `now` as the current unix time.
pub fn verify_token_at(token: &str, key: &[u8], now: i64) -> Result<AdminClaims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(claims), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::InvalidFormat);
    };

    let parsed_header: TokenHeader = serde_json::from_slice(&decode_segment(header)?)?;
    if parsed_header.alg != TOKEN_ALGORITHM {
        return Err(TokenError::UnsupportedAlgorithm(parsed_header.alg));
    }

    let signature = decode_segment(signature)?;
    let signing_input_len = header.len() + 1 + claims.len();
    let signing_input = &token[..signing_input_len];
    ring::hmac::verify(&hmac_key(key), signing_input.as_bytes(), &signature)?;

    let claims: AdminClaims = serde_json::from_slice(&decode_segment(claims)?)?;
    if claims.exp <= now {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

/// Strip the `Bearer ` prefix from an `Authorization` header value.
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"super-secret";

    fn claims(exp: i64) -> AdminClaims {
        AdminClaims {
            id: 7,
            rol: "master".to_string(),
            exp,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let token = sign_token(&claims(2_000), KEY).unwrap();
        assert_eq!(token.split('.').count(), 3);
        let verified = verify_token_at(&token, KEY, 1_000).unwrap();
        assert_eq!(verified, claims(2_000));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let token = sign_token(&claims(2_000), KEY).unwrap();
        assert!(matches!(
            verify_token_at(&token, b"other-secret", 1_000),
            Err(TokenError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = sign_token(&claims(1_000), KEY).unwrap();
        assert!(matches!(
            verify_token_at(&token, KEY, 1_000),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let token = sign_token(&claims(2_000), KEY).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = encode_segment(br#"{"id":1,"rol":"master","exp":2000}"#);
        parts[1] = &forged;
        let forged_token = parts.join(".");
        assert!(matches!(
            verify_token_at(&forged_token, KEY, 1_000),
            Err(TokenError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(
            verify_token_at("abc", KEY, 0),
            Err(TokenError::InvalidFormat)
        ));
        assert!(matches!(
            verify_token_at("a.b.c.d", KEY, 0),
            Err(TokenError::InvalidFormat)
        ));
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Basic abc"), None);
    }
}
