//! HTTP client for the identity provider and backend endpoints.
//!
//! One call per remote operation: code-for-token exchange, token refresh,
//! token revocation, and userinfo lookup. Exchange and userinfo failures
//! propagate; refresh reports a soft failure because an expired refresh
//! token is an expected condition, not an exceptional one.

use async_trait::async_trait;
use copper_lantern_identity::{TokenSet, UserInfo};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// The network operations the session manager depends on.
///
/// `ProviderClient` is the real implementation; tests substitute their own.
#[async_trait(?Send)]
pub trait ProviderApi {
    /// Exchanges an authorization code for a token set.
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, Report<ProviderError>>;

    /// Trades a refresh token for new tokens.
    ///
    /// `None` means "the refresh did not happen"; callers keep the
    /// session they have and may fall back to a fresh login.
    async fn refresh(&self, refresh_token: &str) -> Option<RefreshedTokens>;

    /// Asks the backend to revoke a token. The response body is ignored;
    /// logout treats any failure as best-effort and proceeds locally.
    async fn revoke(&self, token: &str) -> Result<(), Report<ProviderError>>;

    /// Fetches the user profile from the userinfo endpoint.
    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, Report<ProviderError>>;
}

/// Token-endpoint response for a code exchange.
///
/// The provider also returns `token_type` and `expires_in`; the stored set
/// carries no expiry, so they are ignored here.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenEndpointResponse {
    fn into_token_set(self) -> TokenSet {
        TokenSet::new(self.access_token, self.id_token).with_refresh_token(self.refresh_token)
    }
}

/// Tokens returned by the backend refresh endpoint.
///
/// The identity token is optional on this path: a response without one
/// means the previously stored identity token stays in effect.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedTokens {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl RefreshedTokens {
    /// Builds the replacement token set, retaining `previous_id_token`
    /// when the response did not carry a new identity token.
    #[must_use]
    pub fn into_token_set(self, previous_id_token: &str) -> TokenSet {
        let id_token = self
            .id_token
            .unwrap_or_else(|| previous_id_token.to_string());
        TokenSet::new(self.access_token, id_token).with_refresh_token(self.refresh_token)
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct RevokeRequest<'a> {
    token: &'a str,
}

/// Client for the identity provider and the backend auth endpoints.
pub struct ProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Creates a client for the configured provider.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait(?Send)]
impl ProviderApi for ProviderClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, Report<ProviderError>> {
        let response = self
            .http
            .post(self.config.token_endpoint())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id()),
                ("redirect_uri", self.config.redirect_uri()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ExchangeFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let tokens: TokenEndpointResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        debug!("exchanged authorization code for tokens");
        Ok(tokens.into_token_set())
    }

    async fn refresh(&self, refresh_token: &str) -> Option<RefreshedTokens> {
        let result = self
            .http
            .post(self.config.refresh_endpoint())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "token refresh request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "token refresh rejected");
            return None;
        }

        match response.json::<RefreshedTokens>().await {
            Ok(tokens) => {
                debug!("refreshed token set");
                Some(tokens)
            }
            Err(error) => {
                warn!(%error, "invalid refresh response");
                None
            }
        }
    }

    async fn revoke(&self, token: &str) -> Result<(), Report<ProviderError>> {
        let response = self
            .http
            .post(self.config.revoke_endpoint())
            .json(&RevokeRequest { token })
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::RevocationFailed {
                status: status.as_u16(),
            }
            .into());
        }

        debug!("token revoked");
        Ok(())
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, Report<ProviderError>> {
        let response = self
            .http
            .get(self.config.userinfo_endpoint())
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::UserInfoFailed {
                status: status.as_u16(),
            }
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                reason: e.to_string(),
            }
            .into())
    }
}
