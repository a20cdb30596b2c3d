//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, set transaction), added in `main`
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session lock (serialize requests per session cookie)
//! 5. Session layer (tower-sessions, signed cookie)
//! 6. Security headers (CSP, framing, caching)
//! 7. Rate limiting on `POST /login` and `POST /register` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_lock;

pub use auth::Visitor;
pub use rate_limit::auth_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
pub use session_lock::{SessionLocks, serialize_session_requests};
