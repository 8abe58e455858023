//! Process-wide authentication context.
//!
//! A thin reactive layer over the session manager: the current user and a
//! loading flag as signals, provided once per application instance and
//! consumed anywhere in the tree via `use_auth`. Consumers never see raw
//! transport errors, only "authenticated or not" plus a user-actionable
//! message when a popup login fails.

use std::rc::Rc;

use copper_lantern_auth_client::{ProviderClient, ProviderConfig, SessionManager};
use copper_lantern_identity::UserInfo;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[cfg(target_arch = "wasm32")]
use copper_lantern_auth_client::browser::web::{WebSessionStorage, WebWindow};
#[cfg(not(target_arch = "wasm32"))]
use copper_lantern_auth_client::{HeadlessWindow, MemoryStore};

#[cfg(target_arch = "wasm32")]
type AppSessionManager = SessionManager<WebSessionStorage, WebWindow, ProviderClient>;
#[cfg(not(target_arch = "wasm32"))]
type AppSessionManager = SessionManager<MemoryStore, HeadlessWindow, ProviderClient>;

/// The identity-provider configuration compiled into this build.
fn provider_config() -> ProviderConfig {
    ProviderConfig::new(
        "http://localhost:8000/v1/dex".to_string(),
        "backend-client".to_string(),
        "http://localhost:8081/oidc/callback".to_string(),
    )
}

#[cfg(target_arch = "wasm32")]
fn new_session_manager() -> Option<AppSessionManager> {
    let config = provider_config();
    let window = WebWindow::new()?;
    let storage = WebSessionStorage::new()?;
    Some(SessionManager::new(
        storage,
        window,
        ProviderClient::new(config.clone()),
        config,
    ))
}

#[cfg(not(target_arch = "wasm32"))]
fn new_session_manager() -> Option<AppSessionManager> {
    let config = provider_config();
    Some(SessionManager::new(
        MemoryStore::new(),
        HeadlessWindow::new(),
        ProviderClient::new(config.clone()),
        config,
    ))
}

/// Authentication state and operations, shared through Leptos context.
#[derive(Clone, Copy)]
pub struct AuthContext {
    user: RwSignal<Option<UserInfo>>,
    is_loading: RwSignal<bool>,
    login_error: RwSignal<Option<String>>,
    manager: StoredValue<Option<Rc<AppSessionManager>>, LocalStorage>,
}

impl AuthContext {
    fn new() -> Self {
        let manager = new_session_manager().map(Rc::new);
        if manager.is_none() {
            tracing::error!("browser environment unavailable; authentication disabled");
        }
        Self {
            user: RwSignal::new(None),
            is_loading: RwSignal::new(true),
            login_error: RwSignal::new(None),
            manager: StoredValue::new_local(manager),
        }
    }

    /// Adopts a pending provider response or an existing stored session.
    fn initialize(&self) {
        if let Some(manager) = self.manager.get_value() {
            self.user.set(manager.initialize());
        }
        self.is_loading.set(false);
    }

    /// Returns the current user, if authenticated.
    pub fn user(&self) -> Option<UserInfo> {
        self.user.get()
    }

    /// Returns true while the startup session check is in progress or a
    /// popup login is running.
    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    /// Returns the last popup-login failure, if any.
    pub fn login_error(&self) -> Option<String> {
        self.login_error.get()
    }

    /// Starts the redirect login strategy.
    ///
    /// Control leaves the page; the session materializes on the next load.
    pub fn login(&self) {
        if let Some(manager) = self.manager.get_value() {
            let _navigation = manager.login_redirect();
        }
    }

    /// Starts the popup login strategy.
    pub fn login_with_popup(&self) {
        let Some(manager) = self.manager.get_value() else {
            return;
        };
        let user = self.user;
        let is_loading = self.is_loading;
        let login_error = self.login_error;

        spawn_local(async move {
            is_loading.set(true);
            login_error.set(None);
            match manager.login_popup().await {
                Ok(profile) => user.set(Some(profile)),
                Err(error) => {
                    tracing::warn!(%error, "popup login failed");
                    login_error.set(Some(error.to_string()));
                }
            }
            is_loading.set(false);
        });
    }

    /// Ends the session: best-effort revocation, then local teardown.
    pub fn logout(&self) {
        let Some(manager) = self.manager.get_value() else {
            return;
        };
        let user = self.user;

        spawn_local(async move {
            manager.logout().await;
            user.set(None);
        });
    }
}

/// Creates the authentication context and provides it to the tree.
///
/// Call once at the application root.
pub fn provide_auth_context() {
    let context = AuthContext::new();
    provide_context(context);
    context.initialize();
}

/// Retrieves the authentication context.
///
/// # Panics
///
/// Panics if `provide_auth_context` was not called in an ancestor.
pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}
