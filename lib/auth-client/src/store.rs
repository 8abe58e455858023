//! Session-scoped token storage.
//!
//! The store holds the four entries that make up a session (access token,
//! identity token, optional refresh token, and the user record as JSON)
//! and is cleared as a unit on logout, never partially. All operations are
//! synchronous and touch nothing but the storage medium.
//!
//! `KeyValueStore` is the seam to the browser: the WASM build wraps the
//! tab's `sessionStorage` (see [`crate::browser::web`]); tests and host
//! builds use [`MemoryStore`].

use copper_lantern_identity::{Session, TokenSet, UserInfo};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Storage key for the access token.
const ACCESS_TOKEN_KEY: &str = "lantern_access_token";
/// Storage key for the identity token.
const ID_TOKEN_KEY: &str = "lantern_id_token";
/// Storage key for the refresh token.
const REFRESH_TOKEN_KEY: &str = "lantern_refresh_token";
/// Storage key for the user record (JSON).
const USER_KEY: &str = "lantern_user";

/// A synchronous string key/value store scoped to the session lifetime.
///
/// Implementations swallow storage-medium failures; a failed write shows
/// up as an absent read, which the store already degrades on.
pub trait KeyValueStore {
    /// Returns the value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Sets `key` to `value`.
    fn set(&self, key: &str, value: &str);

    /// Removes `key`.
    fn remove(&self, key: &str);
}

/// The owner of the persisted session representation.
pub struct TokenStore<S> {
    inner: S,
}

impl<S: KeyValueStore> TokenStore<S> {
    /// Wraps a key/value backend.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Reads the current session, if a complete one is stored.
    ///
    /// A session is reported only when the access token, identity token,
    /// and a parseable user record are all present. Anything less, such as
    /// a partially written set or a corrupt user record, degrades to
    /// "logged out"; it never raises to the caller.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        let access_token = self.inner.get(ACCESS_TOKEN_KEY)?;
        let Some(id_token) = self.inner.get(ID_TOKEN_KEY) else {
            tracing::warn!("access token present without identity token; treating as logged out");
            return None;
        };
        let user_json = self.inner.get(USER_KEY)?;

        let user: UserInfo = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(%error, "stored user record is corrupt; treating as logged out");
                return None;
            }
        };

        let tokens = TokenSet::new(access_token, id_token)
            .with_refresh_token(self.inner.get(REFRESH_TOKEN_KEY));

        Some(Session::new(tokens, user))
    }

    /// Replaces the stored session wholesale.
    ///
    /// A refresh token absent from the new set removes any previously
    /// stored one; nothing from an earlier session may linger.
    pub fn put(&self, tokens: &TokenSet, user: &UserInfo) {
        let user_json = match serde_json::to_string(user) {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(%error, "failed to serialize user record; store unchanged");
                return;
            }
        };

        self.inner.set(ACCESS_TOKEN_KEY, tokens.access_token());
        self.inner.set(ID_TOKEN_KEY, tokens.id_token());
        match tokens.refresh_token() {
            Some(refresh_token) => self.inner.set(REFRESH_TOKEN_KEY, refresh_token),
            None => self.inner.remove(REFRESH_TOKEN_KEY),
        }
        self.inner.set(USER_KEY, &user_json);
    }

    /// Removes all session entries together.
    pub fn clear(&self) {
        self.inner.remove(ACCESS_TOKEN_KEY);
        self.inner.remove(ID_TOKEN_KEY);
        self.inner.remove(REFRESH_TOKEN_KEY);
        self.inner.remove(USER_KEY);
    }
}

/// In-memory key/value store.
///
/// Clones share the same entries, so a test can hold a handle onto the
/// storage a manager owns.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> UserInfo {
        UserInfo::new("u1".to_string()).with_email(Some("e@x.com".to_string()))
    }

    #[test]
    fn empty_store_reports_absent() {
        let store = TokenStore::new(MemoryStore::new());
        assert!(store.get().is_none());
    }

    #[test]
    fn put_then_get_roundtrips() {
        let store = TokenStore::new(MemoryStore::new());
        let tokens = TokenSet::new("a1".to_string(), "i1".to_string())
            .with_refresh_token(Some("r1".to_string()));
        store.put(&tokens, &test_user());

        let session = store.get().expect("session");
        assert_eq!(session.tokens(), &tokens);
        assert_eq!(session.user().subject(), "u1");
    }

    #[test]
    fn clear_always_yields_absent() {
        let store = TokenStore::new(MemoryStore::new());
        store.put(
            &TokenSet::new("a1".to_string(), "i1".to_string()),
            &test_user(),
        );

        store.clear();
        assert!(store.get().is_none());

        // Clearing an already-empty store is fine too.
        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn corrupt_user_record_degrades_to_absent() {
        let backend = MemoryStore::new();
        let store = TokenStore::new(backend.clone());
        backend.set(ACCESS_TOKEN_KEY, "a1");
        backend.set(ID_TOKEN_KEY, "i1");
        backend.set(USER_KEY, "{not json");

        assert!(store.get().is_none());
    }

    #[test]
    fn access_token_without_user_is_absent() {
        let backend = MemoryStore::new();
        let store = TokenStore::new(backend.clone());
        backend.set(ACCESS_TOKEN_KEY, "a1");
        backend.set(ID_TOKEN_KEY, "i1");

        assert!(store.get().is_none());
    }

    #[test]
    fn user_without_access_token_is_absent() {
        let backend = MemoryStore::new();
        let store = TokenStore::new(backend.clone());
        backend.set(USER_KEY, r#"{"sub":"u1"}"#);

        assert!(store.get().is_none());
    }

    #[test]
    fn put_without_refresh_token_removes_stale_one() {
        let store = TokenStore::new(MemoryStore::new());
        let user = test_user();
        store.put(
            &TokenSet::new("a1".to_string(), "i1".to_string())
                .with_refresh_token(Some("r1".to_string())),
            &user,
        );
        store.put(&TokenSet::new("a2".to_string(), "i2".to_string()), &user);

        let session = store.get().expect("session");
        assert_eq!(session.tokens().access_token(), "a2");
        assert!(session.tokens().refresh_token().is_none());
    }
}
