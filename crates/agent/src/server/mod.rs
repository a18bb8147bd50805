//! Axum HTTP(S) server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Inject shared application state (`AppState`) into handlers.
//! - Optionally terminate TLS (rustls) in front of the router.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod tls;
