//! Shopfront storefront library.
//!
//! The storefront serves a product catalog, a per-visitor session cart and a
//! login-gated checkout. It is exposed as a library so the binary and the
//! integration tests build the exact same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;
use tower_sessions::cookie::KeyError;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
    serialize_session_requests,
};
use crate::state::AppState;

/// Build the storefront router over `state`, keeping sessions in `store`.
///
/// Layers, outermost first: tracing, request id, per-session lock, session,
/// security headers. The lock must wrap the session layer so that a
/// session is loaded and saved while the lock is held.
///
/// # Errors
///
/// Returns `KeyError` if the configured session secret is too short to sign
/// cookies with.
pub fn app<S>(state: AppState, store: S) -> Result<Router, KeyError>
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config())?;
    let locks = state.session_locks().clone();

    Ok(routes::routes(state.config())
        .with_state(state)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            locks,
            serialize_session_requests,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        ))
}
