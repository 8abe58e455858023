//! Provider response delivery via the URL fragment.
//!
//! After the redirect login strategy, the backend hands tokens to the page
//! in the URL fragment (`#tokens=<json>`), so they are never sent back to a
//! server on subsequent requests. Consuming the payload stores it and
//! strips the fragment, so a reload or bookmark does not re-deliver
//! secrets.

use copper_lantern_identity::{TokenSet, UserInfo};
use serde::Deserialize;

use crate::browser::BrowserWindow;
use crate::store::{KeyValueStore, TokenStore};

/// Fragment parameter carrying the provider response.
const TOKENS_PARAM: &str = "tokens";

/// The JSON payload delivered in the fragment.
#[derive(Debug, Deserialize)]
struct FragmentPayload {
    access_token: String,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserInfo,
}

/// Consumes a provider response pending in the URL fragment, if any.
///
/// On a parseable payload: stores the token set and user record, strips
/// the fragment from the visible URL, and returns `true`. A malformed
/// payload is logged and returns `false` without touching the store; a
/// failed parse must not clear an existing valid session. No payload
/// returns `false` with no side effects.
pub fn consume_provider_response<S, B>(store: &TokenStore<S>, browser: &B) -> bool
where
    S: KeyValueStore,
    B: BrowserWindow,
{
    let Some(fragment) = browser.fragment() else {
        return false;
    };
    let Some(raw) = tokens_param(&fragment) else {
        return false;
    };

    match serde_json::from_str::<FragmentPayload>(&raw) {
        Ok(payload) => {
            let tokens = TokenSet::new(payload.access_token, payload.id_token)
                .with_refresh_token(payload.refresh_token);
            store.put(&tokens, &payload.user);
            browser.clear_fragment();
            tracing::debug!("adopted provider response from fragment");
            true
        }
        Err(error) => {
            tracing::error!(%error, "failed to parse provider response fragment");
            false
        }
    }
}

/// Extracts the `tokens` parameter from a fragment query string.
fn tokens_param(fragment: &str) -> Option<String> {
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == TOKENS_PARAM)
        .map(|(_, value)| value.into_owned())
}
