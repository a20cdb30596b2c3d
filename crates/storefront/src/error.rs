//! Unified error handling with Sentry integration.
//!
//! Handlers recover the expected domain failures themselves (re-rendering a
//! form or redirecting). Whatever is left reaches `AppError`, which maps the
//! remaining domain cases to the same redirects and turns storage and session
//! failures into a logged, Sentry-captured 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use shopfront_core::Username;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CheckoutError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}

enum Outcome {
    Redirect(&'static str),
    Status(StatusCode),
    ServerError,
}

impl AppError {
    fn outcome(&self) -> Outcome {
        match self {
            Self::Cart(CartError::NotFound(_))
            | Self::Checkout(CheckoutError::EmptyCart | CheckoutError::InvalidTransition { .. }) => {
                Outcome::Redirect("/")
            }
            Self::Auth(AuthError::Unauthenticated)
            | Self::Checkout(CheckoutError::Unauthenticated) => Outcome::Redirect("/login"),
            Self::Auth(AuthError::InvalidCredentials) => Outcome::Status(StatusCode::UNAUTHORIZED),
            Self::Auth(AuthError::UsernameTaken) => Outcome::Status(StatusCode::CONFLICT),
            Self::Auth(AuthError::InvalidUsername(_) | AuthError::WeakPassword(_)) => {
                Outcome::Status(StatusCode::BAD_REQUEST)
            }
            Self::Checkout(CheckoutError::Validation(_)) => {
                Outcome::Status(StatusCode::UNPROCESSABLE_ENTITY)
            }
            _ => Outcome::ServerError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.outcome() {
            Outcome::Redirect(to) => Redirect::to(to).into_response(),
            Outcome::Status(status) => (status, self.to_string()).into_response(),
            Outcome::ServerError => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );

                // Don't expose internal error details to clients
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a login or registration.
pub fn set_sentry_user(username: &Username) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;
    use shopfront_core::ProductId;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_errors_redirect() {
        let response = AppError::Cart(CartError::NotFound(ProductId::new(9))).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).map(|v| v.as_bytes()), Some(&b"/"[..]));

        let response = AppError::Checkout(CheckoutError::Unauthenticated).into_response();
        assert_eq!(
            response.headers().get(LOCATION).map(|v| v.as_bytes()),
            Some(&b"/login"[..])
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UsernameTaken)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::Validation(vec![]))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::PasswordHash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("dup".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
