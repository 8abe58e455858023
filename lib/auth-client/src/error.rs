//! Error types for the auth-client crate.
//!
//! The taxonomy follows the flows' propagation policy:
//! - `ProviderError`: network-bound failures from the identity provider or
//!   the backend proxy. Exchange failures abort the login attempt; refresh
//!   and revoke callers downgrade these to soft failures.
//! - `PopupError`: user-actionable failures of the popup strategy.
//! - `LoginError`: what a complete popup login surfaces to the caller.

use copper_lantern_identity::ClaimsError;
use std::fmt;

/// Errors from calls against the provider or backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The token endpoint rejected the code exchange.
    ExchangeFailed { status: u16, body: String },
    /// The request never completed (network or transport failure).
    RequestFailed { reason: String },
    /// The endpoint answered with a body that did not parse.
    InvalidResponse { reason: String },
    /// The revocation endpoint rejected the request.
    RevocationFailed { status: u16 },
    /// The userinfo endpoint rejected the access token.
    UserInfoFailed { status: u16 },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExchangeFailed { status, body } => {
                write!(f, "token exchange failed with status {status}: {body}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "request to provider failed: {reason}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid provider response: {reason}")
            }
            Self::RevocationFailed { status } => {
                write!(f, "token revocation failed with status {status}")
            }
            Self::UserInfoFailed { status } => {
                write!(f, "userinfo request failed with status {status}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Failures of the popup login strategy.
///
/// These are surfaced to the user as distinct, actionable reasons: a
/// blocked popup needs a browser-settings change, a cancelled one a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupError {
    /// The browser refused to open the popup window.
    Blocked,
    /// The popup was closed before the provider delivered a result.
    Cancelled,
    /// The provider reported that authorization failed.
    AuthorizationFailed { reason: String },
}

impl fmt::Display for PopupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "popup blocked by the browser"),
            Self::Cancelled => write!(f, "authentication cancelled"),
            Self::AuthorizationFailed { reason } => {
                write!(f, "authorization failed: {reason}")
            }
        }
    }
}

impl std::error::Error for PopupError {}

/// Errors from a complete popup login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The popup flow did not yield an authorization code.
    Popup(PopupError),
    /// The code-for-token exchange failed.
    Exchange { reason: String },
    /// The delivered identity token could not be decoded.
    IdentityToken(ClaimsError),
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Popup(err) => write!(f, "{err}"),
            Self::Exchange { reason } => write!(f, "login failed: {reason}"),
            Self::IdentityToken(err) => write!(f, "login failed: {err}"),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<PopupError> for LoginError {
    fn from(err: PopupError) -> Self {
        Self::Popup(err)
    }
}
