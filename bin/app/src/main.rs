//! copper-lantern application entry point.
//!
//! A client-side-rendered Leptos application; build and serve with trunk.

#[cfg(target_arch = "wasm32")]
fn main() {
    use copper_lantern_app::app::App;

    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    // The app only runs in the browser; host builds exist for `cargo test`.
}
