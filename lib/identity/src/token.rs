//! Token sets and the session pairing.
//!
//! A `TokenSet` is the triple obtained from a successful code exchange,
//! fragment delivery, or refresh. It is owned by the token store and
//! replaced wholesale on each acquisition: a refresh either yields a full
//! replacement set or the prior set is retained unchanged.

use crate::user::UserInfo;

/// The credentials acquired from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    /// Credential for calling protected resource endpoints.
    access_token: String,
    /// Signed, claims-bearing token asserting the subject's identity.
    id_token: String,
    /// Long-lived credential for obtaining new tokens without
    /// re-authentication. Not all providers issue one.
    refresh_token: Option<String>,
}

impl TokenSet {
    /// Creates a token set without a refresh token.
    #[must_use]
    pub fn new(access_token: String, id_token: String) -> Self {
        Self {
            access_token,
            id_token,
            refresh_token: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the identity token.
    #[must_use]
    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    /// Returns the refresh token, if one was issued.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

/// An established session: the token set plus the user it belongs to.
///
/// A session is valid if and only if both parts are present in storage;
/// one without the other is reported as logged out, never as a partially
/// authenticated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    tokens: TokenSet,
    user: UserInfo,
}

impl Session {
    /// Pairs a token set with the user it authenticates.
    #[must_use]
    pub fn new(tokens: TokenSet, user: UserInfo) -> Self {
        Self { tokens, user }
    }

    /// Returns the session's token set.
    #[must_use]
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Returns the authenticated user's profile.
    #[must_use]
    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    /// Consumes the session, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (TokenSet, UserInfo) {
        (self.tokens, self.user)
    }
}
