//! Browser-side OIDC authorization-code client for copper-lantern.
//!
//! This crate provides:
//! - Session-scoped token storage (`TokenStore`, `KeyValueStore`)
//! - Provider response delivery via the URL fragment
//! - The provider HTTP client (`ProviderClient`, `ProviderApi`)
//! - The redirect and popup login strategies (`RedirectFlow`, `PopupFlow`)
//! - The application-wide session manager (`SessionManager`)
//!
//! # Strategy Model
//!
//! Two login strategies share the same endpoints but diverge in transport:
//! the redirect strategy leaves the page and completes on the next load by
//! consuming the URL fragment; the popup strategy stays on the page and
//! resolves a cross-window message against a closed-popup poll.
//!
//! All browser access goes through the port traits in [`browser`], so the
//! protocol logic compiles and tests on non-wasm targets.

pub mod browser;
pub mod client;
pub mod config;
pub mod error;
pub mod fragment;
pub mod popup;
pub mod redirect;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use browser::{BrowserWindow, MessageSubscription, PopupHandle, WindowMessage};
pub use client::{ProviderApi, ProviderClient, RefreshedTokens};
pub use config::ProviderConfig;
pub use error::{LoginError, PopupError, ProviderError};
pub use fragment::consume_provider_response;
pub use popup::PopupFlow;
pub use redirect::{NavigationStarted, RedirectFlow, generate_state};
pub use session::SessionManager;
pub use store::{KeyValueStore, MemoryStore, TokenStore};

#[cfg(not(target_arch = "wasm32"))]
pub use browser::HeadlessWindow;
