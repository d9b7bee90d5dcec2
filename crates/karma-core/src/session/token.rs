//! Bearer token payload decoding.
//!
//! Claims are read from the payload segment of a `header.payload.signature`
//! token. The signature is NOT verified here; the identity is display data
//! and the server remains the only authority on whether the token is valid.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::AdminError;

/// Identity of the signed-in administrator, as claimed by the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, alias = "is_admin")]
    pub admin: bool,
    #[serde(default, alias = "username")]
    pub name: String,
}

impl UserIdentity {
    /// Returns the best human-readable label for this identity.
    pub fn display_name(&self) -> &str {
        [&self.name, &self.email, &self.phone]
            .into_iter()
            .find(|v| !v.trim().is_empty())
            .map_or(self.uid.as_str(), String::as_str)
    }
}

/// Decodes the identity claims carried in a bearer token.
///
/// # Errors
/// Returns a `Decode` error if the token is not three dot-separated segments,
/// the payload is not base64url, or the JSON lacks a `uid` claim.
pub fn decode_identity(token: &str) -> Result<UserIdentity, AdminError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(AdminError::decode(
            "Malformed token: expected three dot-separated segments",
        ));
    }

    let payload = parts[1].trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AdminError::decode(format!("Malformed token payload: {e}")))?;

    serde_json::from_slice(&decoded)
        .map_err(|e| AdminError::decode(format!("Token payload is missing identity claims: {e}")))
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    match token.get(..12) {
        Some(prefix) => format!("{prefix}..."),
        None => "***".to_string(),
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
