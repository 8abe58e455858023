//! copper-lantern web application.
//!
//! This crate provides the Leptos-based, client-side-rendered interface
//! over the copper-lantern auth client: the application shell, the shared
//! authentication context, and the popup callback relay page.

#![allow(non_snake_case)]

pub mod app;
pub mod auth;
pub mod callback;
