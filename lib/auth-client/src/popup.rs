//! The popup-window login strategy.
//!
//! Opens a child window at the authorization endpoint, then races two
//! completion signals: a same-origin callback message carrying the
//! authorization code, and a polling check that notices the user closing
//! the popup. Both are serialized on the single-threaded event queue; the
//! loop resolves exactly once, and dropping the message subscription and
//! the pending timer releases everything either path held.

use futures::future::{self, Either};
use futures::pin_mut;
use serde::Deserialize;
use std::time::Duration;

use crate::browser::BrowserWindow;
use crate::config::ProviderConfig;
use crate::error::PopupError;

/// Popup window width in pixels.
const POPUP_WIDTH: u32 = 500;
/// Popup window height in pixels.
const POPUP_HEIGHT: u32 = 600;
/// How often the flow checks whether the popup was closed. Cancellation is
/// detected at the next tick, bounding the latency at this interval.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Recognized callback payload posted by the popup's redirect page.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum CallbackMessage {
    #[serde(rename = "oauth-callback")]
    OauthCallback {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

/// Drives the popup login strategy.
pub struct PopupFlow<'a, B> {
    browser: &'a B,
    config: &'a ProviderConfig,
}

impl<'a, B: BrowserWindow> PopupFlow<'a, B> {
    /// Creates a flow over the given window.
    #[must_use]
    pub fn new(browser: &'a B, config: &'a ProviderConfig) -> Self {
        Self { browser, config }
    }

    /// Runs the flow to completion, resolving with the authorization code.
    ///
    /// # Errors
    ///
    /// - [`PopupError::Blocked`] if the browser refused to open the window.
    /// - [`PopupError::Cancelled`] if the popup was closed before the
    ///   provider delivered a result.
    /// - [`PopupError::AuthorizationFailed`] if the callback reported an
    ///   error instead of a code.
    ///
    /// Messages from other origins, and same-origin messages that are not
    /// callback-shaped, are ignored without disturbing the wait.
    pub async fn start_auth_flow(&self) -> Result<String, PopupError> {
        let url = self.config.authorization_request_url(None);
        let popup = self
            .browser
            .open_popup(&url, POPUP_WIDTH, POPUP_HEIGHT)
            .ok_or(PopupError::Blocked)?;

        let origin = self.browser.origin();
        let mut messages = self.browser.callback_messages();

        loop {
            let next_message = messages.next();
            let tick = self.browser.sleep(CLOSE_POLL_INTERVAL);
            pin_mut!(next_message, tick);

            match future::select(next_message, tick).await {
                Either::Left((Some(message), _)) => {
                    if message.origin != origin {
                        tracing::trace!("ignoring message from foreign origin");
                        continue;
                    }
                    let Ok(CallbackMessage::OauthCallback { code, error }) =
                        serde_json::from_value(message.data)
                    else {
                        continue;
                    };

                    popup.close();
                    // Returning drops `messages`, unregistering the
                    // listener; the pending tick drops with it.
                    return match code {
                        Some(code) => Ok(code),
                        None => Err(PopupError::AuthorizationFailed {
                            reason: error.unwrap_or_else(|| "authorization failed".to_string()),
                        }),
                    };
                }
                Either::Left((None, _)) => {
                    tracing::debug!("callback channel ended before a message arrived");
                    return Err(PopupError::Cancelled);
                }
                Either::Right(((), _)) => {
                    if popup.is_closed() {
                        return Err(PopupError::Cancelled);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeWindow;
    use futures::executor::block_on;
    use serde_json::json;

    fn test_config() -> ProviderConfig {
        ProviderConfig::new(
            "http://localhost:8000/v1/dex".to_string(),
            "backend-client".to_string(),
            "http://localhost:8081/oidc/callback".to_string(),
        )
    }

    const ORIGIN: &str = "http://localhost:8081";

    #[test]
    fn resolves_with_code_when_message_arrives_first() {
        let browser = FakeWindow::with_origin(ORIGIN);
        browser.queue_message(ORIGIN, json!({"type": "oauth-callback", "code": "c1"}));
        let config = test_config();

        let code = block_on(PopupFlow::new(&browser, &config).start_auth_flow()).expect("code");

        assert_eq!(code, "c1");
        assert_eq!(browser.popup_close_calls(), 1);
        assert!(!browser.listener_active());
    }

    #[test]
    fn popup_url_omits_state() {
        let browser = FakeWindow::with_origin(ORIGIN);
        browser.queue_message(ORIGIN, json!({"type": "oauth-callback", "code": "c1"}));
        let config = test_config();

        block_on(PopupFlow::new(&browser, &config).start_auth_flow()).expect("code");

        let urls = browser.popup_urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("http://localhost:8000/v1/dex/auth?"));
        assert!(!urls[0].contains("state="));
    }

    #[test]
    fn rejects_when_popup_is_blocked() {
        let browser = FakeWindow::with_origin(ORIGIN);
        browser.block_popups();
        let config = test_config();

        let err =
            block_on(PopupFlow::new(&browser, &config).start_auth_flow()).expect_err("blocked");
        assert_eq!(err, PopupError::Blocked);
    }

    #[test]
    fn rejects_with_cancelled_when_popup_closes_first() {
        let browser = FakeWindow::with_origin(ORIGIN);
        browser.close_popup();
        let config = test_config();

        let err =
            block_on(PopupFlow::new(&browser, &config).start_auth_flow()).expect_err("cancelled");

        assert_eq!(err, PopupError::Cancelled);
        assert!(!browser.listener_active());
    }

    #[test]
    fn carries_the_provider_error_reason() {
        let browser = FakeWindow::with_origin(ORIGIN);
        browser.queue_message(
            ORIGIN,
            json!({"type": "oauth-callback", "error": "access_denied"}),
        );
        let config = test_config();

        let err = block_on(PopupFlow::new(&browser, &config).start_auth_flow()).expect_err("error");

        assert_eq!(
            err,
            PopupError::AuthorizationFailed {
                reason: "access_denied".to_string()
            }
        );
        assert_eq!(browser.popup_close_calls(), 1);
    }

    #[test]
    fn ignores_messages_from_foreign_origins() {
        let browser = FakeWindow::with_origin(ORIGIN);
        browser.queue_message(
            "https://evil.example.com",
            json!({"type": "oauth-callback", "code": "stolen"}),
        );
        browser.close_popup();
        let config = test_config();

        let err = block_on(PopupFlow::new(&browser, &config).start_auth_flow())
            .expect_err("foreign message must not resolve the flow");
        assert_eq!(err, PopupError::Cancelled);
    }

    #[test]
    fn ignores_same_origin_messages_of_other_shapes() {
        let browser = FakeWindow::with_origin(ORIGIN);
        browser.queue_message(ORIGIN, json!({"type": "resize", "width": 400}));
        browser.queue_message(ORIGIN, json!("plain string"));
        browser.queue_message(ORIGIN, json!({"type": "oauth-callback", "code": "c1"}));
        let config = test_config();

        let code = block_on(PopupFlow::new(&browser, &config).start_auth_flow()).expect("code");
        assert_eq!(code, "c1");
    }
}
