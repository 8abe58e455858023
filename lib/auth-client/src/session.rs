//! The application's session manager.
//!
//! One instance per application, owning the token store and the chosen
//! flows. Consumers see "authenticated or not"; raw transport errors stay
//! inside, and popup failures surface as user-actionable reasons.

use copper_lantern_identity::{UserInfo, decode_identity_claims};
use tracing::{debug, warn};

use crate::browser::BrowserWindow;
use crate::client::ProviderApi;
use crate::config::ProviderConfig;
use crate::error::LoginError;
use crate::fragment::consume_provider_response;
use crate::popup::PopupFlow;
use crate::redirect::{NavigationStarted, RedirectFlow};
use crate::store::{KeyValueStore, TokenStore};

/// Session manager over a storage backend, a window, and a provider API.
pub struct SessionManager<S, B, P> {
    store: TokenStore<S>,
    browser: B,
    provider: P,
    config: ProviderConfig,
}

impl<S, B, P> SessionManager<S, B, P>
where
    S: KeyValueStore,
    B: BrowserWindow,
    P: ProviderApi,
{
    /// Creates a manager over the given backends.
    #[must_use]
    pub fn new(storage: S, browser: B, provider: P, config: ProviderConfig) -> Self {
        Self {
            store: TokenStore::new(storage),
            browser,
            provider,
            config,
        }
    }

    /// Establishes the startup session state.
    ///
    /// First consumes a provider response pending in the URL fragment (the
    /// return leg of the redirect strategy), then falls back to a session
    /// already in the store. `None` means unauthenticated.
    #[must_use]
    pub fn initialize(&self) -> Option<UserInfo> {
        let delivered = consume_provider_response(&self.store, &self.browser);
        let session = self.store.get();
        match (&session, delivered) {
            (Some(_), true) => debug!("session adopted from provider response"),
            (Some(_), false) => debug!("existing session restored"),
            (None, _) => debug!("no session present"),
        }
        session.map(|session| session.into_parts().1)
    }

    /// Returns the current user, if a session is held.
    #[must_use]
    pub fn current_user(&self) -> Option<UserInfo> {
        self.store.get().map(|session| session.into_parts().1)
    }

    /// Returns the current access token, if a session is held.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.store
            .get()
            .map(|session| session.tokens().access_token().to_string())
    }

    /// Starts the redirect login strategy. Terminal for this page context;
    /// the session materializes on the next page load via `initialize`.
    pub fn login_redirect(&self) -> NavigationStarted {
        RedirectFlow::new(&self.browser, &self.config).login()
    }

    /// Runs the popup login strategy to a full session.
    ///
    /// Popup flow, code exchange, and identity-claim decoding in sequence;
    /// the store is written only once all three succeed. A failure after
    /// the popup yielded a code clears the store so no partial acquisition
    /// survives; a popup-interaction failure (blocked, cancelled) leaves
    /// whatever session existed before untouched.
    pub async fn login_popup(&self) -> Result<UserInfo, LoginError> {
        let code = PopupFlow::new(&self.browser, &self.config)
            .start_auth_flow()
            .await?;

        match self.complete_popup_login(&code).await {
            Ok(user) => Ok(user),
            Err(error) => {
                warn!(%error, "login failed after authorization; clearing partial state");
                self.store.clear();
                Err(error)
            }
        }
    }

    async fn complete_popup_login(&self, code: &str) -> Result<UserInfo, LoginError> {
        let tokens =
            self.provider
                .exchange_code(code)
                .await
                .map_err(|report| LoginError::Exchange {
                    reason: report.to_string(),
                })?;

        let user = decode_identity_claims(tokens.id_token()).map_err(LoginError::IdentityToken)?;

        self.store.put(&tokens, &user);
        debug!("session established via popup login");
        Ok(user)
    }

    /// Ends the session.
    ///
    /// Revocation is best-effort: a network or server failure is logged
    /// and swallowed, and the local store is cleared regardless, so
    /// logging out always succeeds locally.
    pub async fn logout(&self) {
        if let Some(session) = self.store.get() {
            let token = session.tokens().access_token();
            if let Err(error) = self.provider.revoke(token).await {
                warn!(%error, "token revocation failed; clearing local session anyway");
            }
        }
        self.store.clear();
        debug!("session cleared");
    }

    /// Attempts to refresh the stored token set.
    ///
    /// Returns `false` when no refresh happened (no session, no refresh
    /// token, or the backend declined), and the stored set stays as it
    /// was. On success the set is replaced wholesale, retaining the
    /// previous identity token if the response omitted one.
    pub async fn refresh_session(&self) -> bool {
        let Some(session) = self.store.get() else {
            return false;
        };
        let Some(refresh_token) = session.tokens().refresh_token() else {
            debug!("no refresh token held; skipping refresh");
            return false;
        };

        let Some(refreshed) = self.provider.refresh(refresh_token).await else {
            debug!("refresh did not happen; keeping existing session");
            return false;
        };

        let tokens = refreshed.into_token_set(session.tokens().id_token());
        self.store.put(&tokens, session.user());
        debug!("token set replaced after refresh");
        true
    }
}
