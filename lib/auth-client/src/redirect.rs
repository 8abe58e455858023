//! The full-navigation login strategy.
//!
//! `login` hands the page over to the identity provider; nothing after it
//! runs in this page context. The flow completes in a *separate* execution:
//! when the browser later loads the redirect target, the pending provider
//! response is consumed from the URL fragment.

use base64::Engine;

use crate::browser::BrowserWindow;
use crate::config::ProviderConfig;
use crate::fragment::consume_provider_response;
use crate::store::{KeyValueStore, TokenStore};

/// Marker returned by [`RedirectFlow::login`].
///
/// Navigation is terminal: the browser is leaving this page, so there is
/// no continuation to run. Callers acknowledge the marker instead of
/// expecting a result.
#[must_use = "navigation hands this page to the identity provider; no further code runs here"]
pub struct NavigationStarted(());

/// Generates the opaque `state` value for an authorization request.
///
/// 16 random bytes, base64url without padding. The value correlates a
/// request with its callback; verification happens on the backend, so it
/// is not persisted locally.
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    if let Err(error) = getrandom::fill(&mut bytes) {
        // Only possible on targets without an entropy source.
        tracing::error!(%error, "failed to gather entropy for state value");
    }
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Drives the redirect login strategy.
///
/// Two states: idle, and awaiting the provider once `login` has navigated
/// away. The await has no timeout: control only returns when the browser
/// navigates back, so the flow is bounded by user and provider behavior.
pub struct RedirectFlow<'a, B> {
    browser: &'a B,
    config: &'a ProviderConfig,
}

impl<'a, B: BrowserWindow> RedirectFlow<'a, B> {
    /// Creates a flow over the given window.
    #[must_use]
    pub fn new(browser: &'a B, config: &'a ProviderConfig) -> Self {
        Self { browser, config }
    }

    /// Navigates to the provider's authorization endpoint.
    ///
    /// Builds the authorization URL with a freshly generated `state` and
    /// performs a full navigation. Terminal for this page context.
    pub fn login(&self) -> NavigationStarted {
        let state = generate_state();
        let url = self.config.authorization_request_url(Some(&state));
        tracing::info!("redirecting to identity provider");
        self.browser.navigate(&url);
        NavigationStarted(())
    }

    /// Completes the flow on the redirect target's load.
    ///
    /// Success populates the store from the delivered fragment; failure or
    /// absence of a payload leaves the prior session state, valid or
    /// absent, unchanged.
    pub fn complete<S: KeyValueStore>(&self, store: &TokenStore<S>) -> bool {
        consume_provider_response(store, self.browser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeWindow;
    use crate::store::MemoryStore;

    fn test_config() -> ProviderConfig {
        ProviderConfig::new(
            "http://localhost:8000/v1/dex".to_string(),
            "backend-client".to_string(),
            "http://localhost:8081/oidc/callback".to_string(),
        )
    }

    #[test]
    fn state_is_sixteen_random_bytes_base64url() {
        let state = generate_state();
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&state)
            .expect("valid base64url");
        assert_eq!(bytes.len(), 16);
        assert!(!state.contains('='));
    }

    #[test]
    fn each_login_attempt_gets_a_fresh_state() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn login_navigates_to_authorization_endpoint_with_state() {
        let browser = FakeWindow::with_origin("http://localhost:8081");
        let config = test_config();
        let flow = RedirectFlow::new(&browser, &config);

        let _navigation = flow.login();

        let navigations = browser.navigations();
        assert_eq!(navigations.len(), 1);
        let url = &navigations[0];
        assert!(url.starts_with("http://localhost:8000/v1/dex/auth?"));
        assert!(url.contains("client_id=backend-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state="));
    }

    #[test]
    fn complete_adopts_a_delivered_fragment() {
        let browser = FakeWindow::with_origin("http://localhost:8081");
        browser.set_fragment(
            &url::form_urlencoded::Serializer::new(String::new())
                .append_pair(
                    "tokens",
                    r#"{"access_token":"a1","id_token":"i1","user":{"sub":"u1"}}"#,
                )
                .finish(),
        );
        let config = test_config();
        let store = TokenStore::new(MemoryStore::new());

        assert!(RedirectFlow::new(&browser, &config).complete(&store));
        assert_eq!(store.get().expect("session").user().subject(), "u1");
    }

    #[test]
    fn complete_without_payload_changes_nothing() {
        let browser = FakeWindow::with_origin("http://localhost:8081");
        let config = test_config();
        let store = TokenStore::new(MemoryStore::new());

        assert!(!RedirectFlow::new(&browser, &config).complete(&store));
        assert!(store.get().is_none());
    }
}
