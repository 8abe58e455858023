//! Browser port traits and their implementations.
//!
//! The flows talk to the browser through these traits instead of `web-sys`
//! directly, so the protocol logic compiles and tests on any target:
//! - `BrowserWindow`: navigation, fragment access, popup opening, callback
//!   messages, and timers for the host page.
//! - `PopupHandle`: the child window a popup flow holds open.
//! - `MessageSubscription`: a stream of cross-window messages whose DOM
//!   listener is released when the subscription drops.
//!
//! The `web` submodule provides the `web-sys`-backed implementations for
//! the wasm32 build; `HeadlessWindow` is the inert stand-in elsewhere.

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use std::any::Any;
use std::time::Duration;

/// A message received on the host window.
///
/// The origin is carried so flows can apply their own same-origin policy;
/// the data is the message payload decoded to JSON, when it is JSON.
#[derive(Debug, Clone)]
pub struct WindowMessage {
    /// Origin of the sending window.
    pub origin: String,
    /// The message payload.
    pub data: serde_json::Value,
}

/// The child window held open by a popup flow.
pub trait PopupHandle {
    /// Returns true once the window has been closed (by us or the user).
    fn is_closed(&self) -> bool;

    /// Closes the window.
    fn close(&self);
}

/// A subscription to the host window's incoming messages.
///
/// Dropping the subscription unregisters the underlying listener; holding
/// it is what keeps the listener alive.
pub struct MessageSubscription {
    receiver: mpsc::UnboundedReceiver<WindowMessage>,
    _registration: Option<Box<dyn Any>>,
}

impl MessageSubscription {
    /// Builds a subscription from a receiving channel and the registration
    /// guard that keeps the listener installed.
    #[must_use]
    pub fn new(
        receiver: mpsc::UnboundedReceiver<WindowMessage>,
        registration: Option<Box<dyn Any>>,
    ) -> Self {
        Self {
            receiver,
            _registration: registration,
        }
    }

    /// Waits for the next message. Returns `None` if the source is gone.
    pub async fn next(&mut self) -> Option<WindowMessage> {
        self.receiver.next().await
    }
}

/// The host page's window, as the flows see it.
#[async_trait(?Send)]
pub trait BrowserWindow {
    /// Returns the page's origin.
    fn origin(&self) -> String;

    /// Returns the current URL fragment without the leading `#`, if any.
    fn fragment(&self) -> Option<String>;

    /// Strips the fragment from the visible URL.
    fn clear_fragment(&self);

    /// Navigates the page away. Terminal for the current page context.
    fn navigate(&self, url: &str);

    /// Opens a centered popup window. `None` means the browser blocked it.
    fn open_popup(&self, url: &str, width: u32, height: u32) -> Option<Box<dyn PopupHandle>>;

    /// Subscribes to messages posted to this window.
    fn callback_messages(&self) -> MessageSubscription;

    /// Resolves after roughly `duration` on the host event loop.
    async fn sleep(&self, duration: Duration);
}

/// Inert window for non-browser targets.
///
/// Host-side builds (tests, `cargo check`) construct the app against this
/// implementation; every operation degrades the way an absent browser
/// capability would.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Default)]
pub struct HeadlessWindow;

#[cfg(not(target_arch = "wasm32"))]
impl HeadlessWindow {
    /// Creates a headless window.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl BrowserWindow for HeadlessWindow {
    fn origin(&self) -> String {
        String::new()
    }

    fn fragment(&self) -> Option<String> {
        None
    }

    fn clear_fragment(&self) {}

    fn navigate(&self, url: &str) {
        tracing::warn!(url, "navigation is not available outside the browser");
    }

    fn open_popup(&self, _url: &str, _width: u32, _height: u32) -> Option<Box<dyn PopupHandle>> {
        None
    }

    fn callback_messages(&self) -> MessageSubscription {
        // Sender dropped immediately: the stream ends right away.
        let (_sender, receiver) = mpsc::unbounded();
        MessageSubscription::new(receiver, None)
    }

    async fn sleep(&self, _duration: Duration) {}
}

/// `web-sys`-backed implementations for the browser build.
#[cfg(target_arch = "wasm32")]
pub mod web {
    use super::{BrowserWindow, MessageSubscription, PopupHandle, WindowMessage};
    use crate::store::KeyValueStore;
    use async_trait::async_trait;
    use futures::channel::{mpsc, oneshot};
    use std::time::Duration;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    /// The real browser window.
    #[derive(Clone)]
    pub struct WebWindow {
        window: web_sys::Window,
    }

    impl WebWindow {
        /// Wraps the global window. `None` outside a browsing context.
        #[must_use]
        pub fn new() -> Option<Self> {
            web_sys::window().map(|window| Self { window })
        }
    }

    /// Keeps a `message` listener installed; removes it on drop.
    struct MessageListener {
        window: web_sys::Window,
        closure: Closure<dyn FnMut(web_sys::MessageEvent)>,
    }

    impl Drop for MessageListener {
        fn drop(&mut self) {
            let _ = self
                .window
                .remove_event_listener_with_callback("message", self.closure.as_ref().unchecked_ref());
        }
    }

    /// Clears a pending timeout if the sleep future is dropped early.
    struct TimeoutGuard {
        window: web_sys::Window,
        handle: i32,
    }

    impl Drop for TimeoutGuard {
        fn drop(&mut self) {
            self.window.clear_timeout_with_handle(self.handle);
        }
    }

    #[async_trait(?Send)]
    impl BrowserWindow for WebWindow {
        fn origin(&self) -> String {
            self.window.location().origin().unwrap_or_default()
        }

        fn fragment(&self) -> Option<String> {
            let hash = self.window.location().hash().ok()?;
            let fragment = hash.strip_prefix('#').unwrap_or(&hash);
            if fragment.is_empty() {
                None
            } else {
                Some(fragment.to_string())
            }
        }

        fn clear_fragment(&self) {
            let _ = self.window.location().set_hash("");
        }

        fn navigate(&self, url: &str) {
            let _ = self.window.location().set_href(url);
        }

        fn open_popup(&self, url: &str, width: u32, height: u32) -> Option<Box<dyn PopupHandle>> {
            let as_f64 = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
                value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
            };
            let left = as_f64(self.window.screen_x())
                + (as_f64(self.window.outer_width()) - f64::from(width)) / 2.0;
            let top = as_f64(self.window.screen_y())
                + (as_f64(self.window.outer_height()) - f64::from(height)) / 2.0;

            let features = format!("width={width},height={height},left={left},top={top}");
            let popup = self
                .window
                .open_with_url_and_target_and_features(url, "lantern-auth", &features)
                .ok()
                .flatten()?;

            Some(Box::new(WebPopup { window: popup }))
        }

        fn callback_messages(&self) -> MessageSubscription {
            let (sender, receiver) = mpsc::unbounded();

            let closure = Closure::wrap(Box::new(move |event: web_sys::MessageEvent| {
                // Non-JSON payloads are not callback messages; skip them.
                let Ok(json) = js_sys::JSON::stringify(&event.data()) else {
                    return;
                };
                let Some(json) = json.as_string() else {
                    return;
                };
                let Ok(data) = serde_json::from_str(&json) else {
                    return;
                };
                let _ = sender.unbounded_send(WindowMessage {
                    origin: event.origin(),
                    data,
                });
            }) as Box<dyn FnMut(web_sys::MessageEvent)>);

            if let Err(error) = self
                .window
                .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            {
                tracing::error!(?error, "failed to register message listener");
            }

            let registration = MessageListener {
                window: self.window.clone(),
                closure,
            };
            MessageSubscription::new(receiver, Some(Box::new(registration)))
        }

        async fn sleep(&self, duration: Duration) {
            let (sender, receiver) = oneshot::channel::<()>();
            let closure = Closure::once(move || {
                let _ = sender.send(());
            });

            let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
            let Ok(handle) = self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    millis,
                )
            else {
                return;
            };

            let _guard = TimeoutGuard {
                window: self.window.clone(),
                handle,
            };
            let _ = receiver.await;
            drop(closure);
        }
    }

    /// A popup opened by `WebWindow::open_popup`.
    struct WebPopup {
        window: web_sys::Window,
    }

    impl PopupHandle for WebPopup {
        fn is_closed(&self) -> bool {
            self.window.closed().unwrap_or(true)
        }

        fn close(&self) {
            let _ = self.window.close();
        }
    }

    /// `sessionStorage`-backed key/value store.
    ///
    /// Entries live for the tab's session and are not shared across tabs
    /// or browser restarts. Storage failures (quota, disabled storage)
    /// are swallowed; they surface as absent reads.
    #[derive(Clone)]
    pub struct WebSessionStorage {
        storage: web_sys::Storage,
    }

    impl WebSessionStorage {
        /// Wraps the window's `sessionStorage`, if available.
        #[must_use]
        pub fn new() -> Option<Self> {
            let storage = web_sys::window()?.session_storage().ok()??;
            Some(Self { storage })
        }
    }

    impl KeyValueStore for WebSessionStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.storage.get_item(key).ok().flatten()
        }

        fn set(&self, key: &str, value: &str) {
            if let Err(error) = self.storage.set_item(key, value) {
                tracing::warn!(?error, key, "sessionStorage write failed");
            }
        }

        fn remove(&self, key: &str) {
            let _ = self.storage.remove_item(key);
        }
    }
}

/// Controllable window for exercising the flows in tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::{BrowserWindow, MessageSubscription, PopupHandle, WindowMessage};
    use async_trait::async_trait;
    use futures::channel::mpsc;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct State {
        origin: String,
        fragment: Option<String>,
        navigations: Vec<String>,
        popup_blocked: bool,
        popup_urls: Vec<String>,
        queued_messages: VecDeque<WindowMessage>,
    }

    /// Test double for `BrowserWindow`; clones share state.
    #[derive(Clone, Default)]
    pub struct FakeWindow {
        state: Rc<RefCell<State>>,
        popup_closed: Rc<Cell<bool>>,
        popup_close_calls: Rc<Cell<u32>>,
        listener_active: Rc<Cell<bool>>,
        sleep_calls: Rc<Cell<u32>>,
    }

    /// Keeps the fake's sender alive and flips the listener flag on drop,
    /// mirroring listener removal in the browser.
    struct FakeRegistration {
        _sender: mpsc::UnboundedSender<WindowMessage>,
        listener_active: Rc<Cell<bool>>,
    }

    impl Drop for FakeRegistration {
        fn drop(&mut self) {
            self.listener_active.set(false);
        }
    }

    struct FakePopup {
        closed: Rc<Cell<bool>>,
        close_calls: Rc<Cell<u32>>,
    }

    impl PopupHandle for FakePopup {
        fn is_closed(&self) -> bool {
            self.closed.get()
        }

        fn close(&self) {
            self.closed.set(true);
            self.close_calls.set(self.close_calls.get() + 1);
        }
    }

    impl FakeWindow {
        pub fn with_origin(origin: &str) -> Self {
            let window = Self::default();
            window.state.borrow_mut().origin = origin.to_string();
            window
        }

        pub fn set_fragment(&self, fragment: &str) {
            self.state.borrow_mut().fragment = Some(fragment.to_string());
        }

        pub fn current_fragment(&self) -> Option<String> {
            self.state.borrow().fragment.clone()
        }

        pub fn navigations(&self) -> Vec<String> {
            self.state.borrow().navigations.clone()
        }

        pub fn popup_urls(&self) -> Vec<String> {
            self.state.borrow().popup_urls.clone()
        }

        pub fn block_popups(&self) {
            self.state.borrow_mut().popup_blocked = true;
        }

        pub fn close_popup(&self) {
            self.popup_closed.set(true);
        }

        pub fn popup_close_calls(&self) -> u32 {
            self.popup_close_calls.get()
        }

        pub fn listener_active(&self) -> bool {
            self.listener_active.get()
        }

        pub fn queue_message(&self, origin: &str, data: serde_json::Value) {
            self.state
                .borrow_mut()
                .queued_messages
                .push_back(WindowMessage {
                    origin: origin.to_string(),
                    data,
                });
        }
    }

    #[async_trait(?Send)]
    impl BrowserWindow for FakeWindow {
        fn origin(&self) -> String {
            self.state.borrow().origin.clone()
        }

        fn fragment(&self) -> Option<String> {
            self.state.borrow().fragment.clone()
        }

        fn clear_fragment(&self) {
            self.state.borrow_mut().fragment = None;
        }

        fn navigate(&self, url: &str) {
            self.state.borrow_mut().navigations.push(url.to_string());
        }

        fn open_popup(&self, url: &str, _width: u32, _height: u32) -> Option<Box<dyn PopupHandle>> {
            let mut state = self.state.borrow_mut();
            if state.popup_blocked {
                return None;
            }
            state.popup_urls.push(url.to_string());
            Some(Box::new(FakePopup {
                closed: self.popup_closed.clone(),
                close_calls: self.popup_close_calls.clone(),
            }))
        }

        fn callback_messages(&self) -> MessageSubscription {
            let (sender, receiver) = mpsc::unbounded();
            for message in self.state.borrow_mut().queued_messages.drain(..) {
                let _ = sender.unbounded_send(message);
            }
            self.listener_active.set(true);
            let registration = FakeRegistration {
                _sender: sender,
                listener_active: self.listener_active.clone(),
            };
            MessageSubscription::new(receiver, Some(Box::new(registration)))
        }

        async fn sleep(&self, _duration: Duration) {
            self.sleep_calls.set(self.sleep_calls.get() + 1);
        }
    }
}
