//! Brana Storefront library.
//!
//! This crate provides the storefront JSON API as a library, so the binary,
//! the CLI and the integration tests all build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
