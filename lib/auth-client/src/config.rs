//! Identity-provider configuration.
//!
//! Configuration for connecting to the external OIDC provider (directly or
//! through the backend proxy that fronts it). The application compiles its
//! values in; fields with defaults can be omitted when deserializing.

use serde::{Deserialize, Serialize};

/// Configuration for the OIDC identity provider and backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The issuer base URL. Provider endpoints are derived from it
    /// (`{issuer}/auth`, `{issuer}/token`, `{issuer}/userinfo`).
    issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The redirect URI delivered to the provider with each request.
    redirect_uri: String,
    /// Scopes to request, space-delimited as they appear on the wire.
    /// Default: "openid email profile offline_access"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Backend endpoint that exchanges a refresh token for new tokens.
    /// Default: "/api/auth/refresh"
    #[serde(default = "default_refresh_endpoint")]
    refresh_endpoint: String,
    /// Backend endpoint that revokes a token.
    /// Default: "/api/auth/revoke"
    #[serde(default = "default_revoke_endpoint")]
    revoke_endpoint: String,
}

fn default_scopes() -> String {
    "openid email profile offline_access".to_string()
}

fn default_refresh_endpoint() -> String {
    "/api/auth/refresh".to_string()
}

fn default_revoke_endpoint() -> String {
    "/api/auth/revoke".to_string()
}

impl ProviderConfig {
    /// Creates a configuration with defaults for the optional fields.
    #[must_use]
    pub fn new(issuer_url: String, client_id: String, redirect_uri: String) -> Self {
        Self {
            issuer_url,
            client_id,
            redirect_uri,
            scopes: default_scopes(),
            refresh_endpoint: default_refresh_endpoint(),
            revoke_endpoint: default_revoke_endpoint(),
        }
    }

    /// Replaces the scope list (space-delimited).
    #[must_use]
    pub fn with_scopes(mut self, scopes: String) -> Self {
        self.scopes = scopes;
        self
    }

    /// Replaces the backend refresh endpoint.
    #[must_use]
    pub fn with_refresh_endpoint(mut self, endpoint: String) -> Self {
        self.refresh_endpoint = endpoint;
        self
    }

    /// Replaces the backend revoke endpoint.
    #[must_use]
    pub fn with_revoke_endpoint(mut self, endpoint: String) -> Self {
        self.revoke_endpoint = endpoint;
        self
    }

    /// Returns the issuer base URL.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the scopes to request, split from the space-delimited form.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes.split_whitespace().collect()
    }

    /// Returns the raw space-delimited scope string.
    #[must_use]
    pub fn scopes_raw(&self) -> &str {
        &self.scopes
    }

    /// Returns the provider's authorization endpoint.
    #[must_use]
    pub fn authorization_endpoint(&self) -> String {
        format!("{}/auth", self.issuer_url.trim_end_matches('/'))
    }

    /// Returns the provider's token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.issuer_url.trim_end_matches('/'))
    }

    /// Returns the provider's userinfo endpoint.
    #[must_use]
    pub fn userinfo_endpoint(&self) -> String {
        format!("{}/userinfo", self.issuer_url.trim_end_matches('/'))
    }

    /// Returns the backend refresh endpoint.
    #[must_use]
    pub fn refresh_endpoint(&self) -> &str {
        &self.refresh_endpoint
    }

    /// Returns the backend revoke endpoint.
    #[must_use]
    pub fn revoke_endpoint(&self) -> &str {
        &self.revoke_endpoint
    }

    /// Builds the authorization-request URL for the code flow.
    ///
    /// Always carries `client_id`, `redirect_uri`, `response_type=code`,
    /// and the space-delimited scope list; `state` is appended when the
    /// strategy supplies one.
    #[must_use]
    pub fn authorization_request_url(&self, state: Option<&str>) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("client_id", &self.client_id);
        query.append_pair("redirect_uri", &self.redirect_uri);
        query.append_pair("response_type", "code");
        query.append_pair("scope", &self.scopes);
        if let Some(state) = state {
            query.append_pair("state", state);
        }
        format!("{}?{}", self.authorization_endpoint(), query.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig::new(
            "http://localhost:8000/v1/dex".to_string(),
            "backend-client".to_string(),
            "http://localhost:8081/oidc/callback".to_string(),
        )
    }

    #[test]
    fn new_config_has_defaults() {
        let config = test_config();
        assert_eq!(config.issuer_url(), "http://localhost:8000/v1/dex");
        assert_eq!(config.client_id(), "backend-client");
        assert_eq!(config.scopes(), vec!["openid", "email", "profile", "offline_access"]);
        assert_eq!(config.refresh_endpoint(), "/api/auth/refresh");
        assert_eq!(config.revoke_endpoint(), "/api/auth/revoke");
    }

    #[test]
    fn endpoints_derive_from_issuer() {
        let config = test_config();
        assert_eq!(
            config.authorization_endpoint(),
            "http://localhost:8000/v1/dex/auth"
        );
        assert_eq!(config.token_endpoint(), "http://localhost:8000/v1/dex/token");
        assert_eq!(
            config.userinfo_endpoint(),
            "http://localhost:8000/v1/dex/userinfo"
        );
    }

    #[test]
    fn trailing_slash_on_issuer_is_tolerated() {
        let config = ProviderConfig::new(
            "https://auth.example.com/".to_string(),
            "client".to_string(),
            "https://app.example.com/callback".to_string(),
        );
        assert_eq!(config.token_endpoint(), "https://auth.example.com/token");
    }

    #[test]
    fn authorization_url_without_state() {
        let url = test_config().authorization_request_url(None);
        assert!(url.starts_with("http://localhost:8000/v1/dex/auth?"));
        assert!(url.contains("client_id=backend-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid+email+profile+offline_access"));
        assert!(!url.contains("state="));
    }

    #[test]
    fn authorization_url_with_state() {
        let url = test_config().authorization_request_url(Some("abc123"));
        assert!(url.contains("state=abc123"));
    }

    #[test]
    fn redirect_uri_is_urlencoded() {
        let url = test_config().authorization_request_url(None);
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8081%2Foidc%2Fcallback"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "issuer_url": "https://auth.example.com",
            "client_id": "my-client",
            "redirect_uri": "https://app.example.com/callback"
        }"#;

        let config: ProviderConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.scopes_raw(), "openid email profile offline_access");
        assert_eq!(config.refresh_endpoint(), "/api/auth/refresh");
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = test_config()
            .with_scopes("openid email".to_string())
            .with_refresh_endpoint("/session/refresh".to_string())
            .with_revoke_endpoint("/session/revoke".to_string());

        assert_eq!(config.scopes(), vec!["openid", "email"]);
        assert_eq!(config.refresh_endpoint(), "/session/refresh");
        assert_eq!(config.revoke_endpoint(), "/session/revoke");
    }
}
