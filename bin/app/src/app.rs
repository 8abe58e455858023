//! Main application component and routing.

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};

use crate::auth::{provide_auth_context, use_auth};
use crate::callback::AuthCallbackPage;

/// The main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    provide_auth_context();

    view! {
        <Title text="copper-lantern"/>
        <Router>
            <Header/>
            <main class="container">
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=HomePage/>
                    <Route path=path!("/oidc/callback") view=AuthCallbackPage/>
                </Routes>
            </main>
        </Router>
    }
}

/// Header with the login state and user menu.
#[component]
fn Header() -> impl IntoView {
    let auth = use_auth();

    view! {
        <header class="header">
            <div class="header-left">
                <a href="/" class="logo">"copper-lantern"</a>
            </div>
            <div class="header-right">
                {move || {
                    if auth.is_loading() {
                        view! { <span>"Loading..."</span> }.into_any()
                    } else if let Some(user) = auth.user() {
                        view! { <UserMenu label=user.display_label().to_string()/> }.into_any()
                    } else {
                        view! {
                            <button class="login-button" on:click=move |_| auth.login()>
                                "Log in"
                            </button>
                        }
                        .into_any()
                    }
                }}
            </div>
        </header>
    }
}

/// User menu with the logout control.
#[component]
fn UserMenu(label: String) -> impl IntoView {
    let auth = use_auth();

    view! {
        <div class="user-menu">
            <span class="user-name">{label}</span>
            <button class="logout-button" on:click=move |_| auth.logout()>
                "Log out"
            </button>
        </div>
    }
}

/// The home page component.
#[component]
fn HomePage() -> impl IntoView {
    let auth = use_auth();

    view! {
        <div class="home-page">
            {move || {
                if auth.is_loading() {
                    view! { <p>"Loading..."</p> }.into_any()
                } else if let Some(user) = auth.user() {
                    let greeting = format!("Welcome, {}!", user.display_label());
                    let email = user.email().map(|email| {
                        view! { <p class="email">{email.to_string()}</p> }
                    });
                    view! {
                        <div>
                            <h1>{greeting}</h1>
                            {email}
                        </div>
                    }
                    .into_any()
                } else {
                    view! {
                        <div class="login-box">
                            <h1>"Log in to copper-lantern"</h1>
                            <p>"Authenticate with your identity provider."</p>
                            <button class="login-button" on:click=move |_| auth.login()>
                                "Log in with SSO"
                            </button>
                            <button class="login-button secondary" on:click=move |_| auth.login_with_popup()>
                                "Log in in a popup"
                            </button>
                            {auth.login_error().map(|message| {
                                view! { <p class="login-error">{message}</p> }
                            })}
                        </div>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}
