//! Token authentication strategy.
//!
//! A request carries its token in exactly one of the `Authorization` header
//! (`<token_key> <token>`), a form body field, or a query parameter. The
//! [`Strategy`](services::auth::Strategy) locates it, hands it to a
//! [`TokenVerifier`](services::auth::TokenVerifier) once, and reports a single
//! [`Disposition`](services::auth::Disposition). The rest of the crate mounts
//! the strategy on an axum router.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
