//! Identity-token claims decoding.
//!
//! The identity token is a JWT: `base64url(header).base64url(payload).signature`.
//! This module decodes the payload segment for display purposes only; no
//! signature verification is performed here. Signature validation is the
//! identity provider's and backend's responsibility; nothing in this
//! application may treat decoded claims as a trust boundary.

use base64::Engine;
use serde::Deserialize;
use std::fmt;

use crate::user::UserInfo;

/// Errors from decoding an identity token's claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// The token did not have the expected three dot-separated segments.
    MalformedToken { segments: usize },
    /// The payload segment was not valid base64url.
    InvalidEncoding { reason: String },
    /// The decoded payload was not valid claims JSON.
    InvalidClaims { reason: String },
}

impl fmt::Display for ClaimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken { segments } => {
                write!(
                    f,
                    "identity token must have 3 segments, found {segments}"
                )
            }
            Self::InvalidEncoding { reason } => {
                write!(f, "failed to decode claims segment: {reason}")
            }
            Self::InvalidClaims { reason } => {
                write!(f, "failed to parse claims: {reason}")
            }
        }
    }
}

impl std::error::Error for ClaimsError {}

/// The recognized claims in an identity token's payload.
///
/// Providers include more; everything unrecognized is ignored.
#[derive(Debug, Deserialize)]
struct IdentityClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
}

/// Decodes the user profile from an identity token.
///
/// Splits the token into its three segments, base64url-decodes the middle
/// segment (unpadded, per JWT), and parses the claims JSON. Decoding the
/// same token twice yields identical results.
///
/// The claims are **display-only and unverified**: this function does not
/// check the signature segment at all.
///
/// # Errors
///
/// Returns an error if the token does not have exactly three segments, the
/// payload is not valid base64url, or the claims JSON is invalid. Callers
/// mid-login must treat any of these as "the login did not complete".
pub fn decode_identity_claims(id_token: &str) -> Result<UserInfo, ClaimsError> {
    let segments: Vec<&str> = id_token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::MalformedToken {
            segments: segments.len(),
        });
    }

    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(segments[1])
        .map_err(|e| ClaimsError::InvalidEncoding {
            reason: e.to_string(),
        })?;

    let claims: IdentityClaims =
        serde_json::from_slice(&payload).map_err(|e| ClaimsError::InvalidClaims {
            reason: e.to_string(),
        })?;

    Ok(UserInfo::new(claims.sub)
        .with_email(claims.email)
        .with_email_verified(claims.email_verified)
        .with_name(claims.name)
        .with_preferred_username(claims.preferred_username))
}
