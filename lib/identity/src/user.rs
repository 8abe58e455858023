//! The authenticated user's profile.
//!
//! `UserInfo` carries the standard OIDC claims the application displays.
//! One instance is derived per session, from the identity token's claims
//! or from a userinfo-endpoint response, and is treated as immutable
//! afterwards; it is stored alongside the token set and invalidated with it.

use serde::{Deserialize, Serialize};

/// Profile claims for the authenticated user.
///
/// Field names on the wire follow the OIDC standard claim names; only the
/// subject is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// The subject claim (unique user identifier from the provider).
    #[serde(rename = "sub")]
    subject: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// Whether the provider has verified the email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email_verified: Option<bool>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// Preferred username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferred_username: Option<String>,
}

impl UserInfo {
    /// Creates a profile with only the subject set.
    #[must_use]
    pub fn new(subject: String) -> Self {
        Self {
            subject,
            email: None,
            email_verified: None,
            name: None,
            preferred_username: None,
        }
    }

    /// Sets the email claim.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the email-verified claim.
    #[must_use]
    pub fn with_email_verified(mut self, verified: Option<bool>) -> Self {
        self.email_verified = verified;
        self
    }

    /// Sets the display name claim.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Sets the preferred-username claim.
    #[must_use]
    pub fn with_preferred_username(mut self, username: Option<String>) -> Self {
        self.preferred_username = username;
        self
    }

    /// Returns the subject claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the email address, if present.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns whether the email address is verified, if known.
    #[must_use]
    pub fn email_verified(&self) -> Option<bool> {
        self.email_verified
    }

    /// Returns the display name, if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the preferred username, if present.
    #[must_use]
    pub fn preferred_username(&self) -> Option<&str> {
        self.preferred_username.as_deref()
    }

    /// Returns the best available label for display in the UI.
    ///
    /// Falls back through name, preferred username, and email before
    /// settling on the opaque subject.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.preferred_username.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(&self.subject)
    }
}
