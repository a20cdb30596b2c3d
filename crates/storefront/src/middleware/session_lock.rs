//! Per-session request serialization.
//!
//! `SessionManagerLayer` loads the session record before the handler runs and
//! writes the whole record back afterwards. Two requests for the same session
//! running side by side would each write their own copy, and the second write
//! would discard the first one's cart change.
//!
//! This middleware sits outside the session layer and holds a per-session
//! mutex, keyed by the session cookie value, from before the record is loaded
//! until after it is saved. Requests for other sessions, and requests without
//! a session cookie, never wait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tower_sessions::cookie::Cookie;

use super::session::SESSION_COOKIE_NAME;

/// Registry of per-session locks.
///
/// Entries are weak: a lock lives only while some request holds or awaits
/// it, and dead entries are pruned on the next acquisition.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<String, Weak<AsyncMutex<()>>>>>,
}

impl SessionLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the session identified by `key`.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| lock.strong_count() > 0);

            if let Some(lock) = locks.get(key).and_then(Weak::upgrade) {
                lock
            } else {
                let lock = Arc::new(AsyncMutex::new(()));
                locks.insert(key.to_owned(), Arc::downgrade(&lock));
                lock
            }
        };

        lock.lock_owned().await
    }

    /// Number of sessions with a live lock.
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}

/// Run the rest of the stack while holding the caller's session lock.
pub async fn serialize_session_requests(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(key) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let _guard = locks.acquire(&key).await;
    next.run(request).await
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}
