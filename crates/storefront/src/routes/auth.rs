//! Authentication route handlers.
//!
//! Handles login, registration and logout with username and password.
//! Failed submissions re-render the form with a message and an error status
//! instead of redirecting.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::Visitor;
use crate::services::AuthError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login and registration form data.
#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub visitor: Visitor,
    pub username: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub visitor: Visitor,
    pub username: String,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(visitor: Visitor) -> impl IntoResponse {
    LoginTemplate {
        visitor,
        username: String::new(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, visitor, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    match state
        .auth()
        .login(&session, &form.username, &form.password)
        .await
    {
        Ok(username) => {
            set_sentry_user(&username);
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::debug!("login rejected");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    visitor,
                    username: form.username,
                    error: Some("Invalid credentials".to_string()),
                },
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(visitor: Visitor) -> impl IntoResponse {
    RegisterTemplate {
        visitor,
        username: String::new(),
        error: None,
    }
}

/// Handle registration form submission.
#[instrument(skip(state, session, visitor, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    let (status, message) = match state
        .auth()
        .register(&session, &form.username, &form.password)
        .await
    {
        Ok(username) => {
            set_sentry_user(&username);
            return Ok(Redirect::to("/").into_response());
        }
        Err(AuthError::UsernameTaken) => (StatusCode::CONFLICT, "Username taken".to_string()),
        Err(AuthError::InvalidUsername(e)) => (StatusCode::BAD_REQUEST, capitalize(&e.to_string())),
        Err(AuthError::WeakPassword(msg)) => (StatusCode::BAD_REQUEST, capitalize(&msg)),
        Err(e) => return Err(e.into()),
    };

    Ok((
        status,
        RegisterTemplate {
            visitor,
            username: form.username,
            error: Some(message),
        },
    )
        .into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Clear the session, identity and cart alike.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    state.auth().logout(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
