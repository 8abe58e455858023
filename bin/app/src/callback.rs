//! Redirect target for the popup login strategy.
//!
//! The provider sends the popup window back here with `code` (or `error`)
//! in the query string. This page relays that result to the window that
//! opened the popup, targeted at the application origin only, and closes
//! itself; the opener's flow does the rest.

use leptos::prelude::*;

/// The page the popup lands on after authorization.
#[component]
pub fn AuthCallbackPage() -> impl IntoView {
    relay_callback_to_opener();

    view! {
        <div class="callback-page">
            <p>"Completing sign-in..."</p>
        </div>
    }
}

/// Extracts `code`/`error` from a query string.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn callback_params(query: &str) -> (Option<String>, Option<String>) {
    let mut code = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    (code, error)
}

#[cfg(target_arch = "wasm32")]
fn relay_callback_to_opener() {
    use wasm_bindgen::JsCast;

    let Some(window) = web_sys::window() else {
        return;
    };

    let search = window.location().search().unwrap_or_default();
    let query = search.strip_prefix('?').unwrap_or(&search).to_string();
    let (code, error) = callback_params(&query);

    let Ok(opener) = window.opener() else {
        return;
    };
    if opener.is_null() || opener.is_undefined() {
        tracing::warn!("no opener window; nothing to deliver the callback to");
        return;
    }
    let opener: web_sys::Window = opener.unchecked_into();

    let payload = serde_json::json!({
        "type": "oauth-callback",
        "code": code,
        "error": error,
    });
    let Ok(message) = js_sys::JSON::parse(&payload.to_string()) else {
        return;
    };

    let origin = window.location().origin().unwrap_or_default();
    if let Err(error) = opener.post_message(&message, &origin) {
        tracing::error!(?error, "failed to deliver callback to opener");
        return;
    }

    let _ = window.close();
}

#[cfg(not(target_arch = "wasm32"))]
fn relay_callback_to_opener() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_code_from_query() {
        let (code, error) = callback_params("code=c1&state=abc");
        assert_eq!(code.as_deref(), Some("c1"));
        assert!(error.is_none());
    }

    #[test]
    fn extracts_error_from_query() {
        let (code, error) = callback_params("error=access_denied");
        assert!(code.is_none());
        assert_eq!(error.as_deref(), Some("access_denied"));
    }

    #[test]
    fn empty_query_yields_neither() {
        let (code, error) = callback_params("");
        assert!(code.is_none());
        assert!(error.is_none());
    }

    #[test]
    fn urlencoded_values_are_decoded() {
        let (_, error) = callback_params("error=access%20denied");
        assert_eq!(error.as_deref(), Some("access denied"));
    }
}
