//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::Username;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::services::{CartView, CheckoutError, OrderConfirmation, OrderDetails};
use crate::state::AppState;

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub visitor: Visitor,
    pub customer: Username,
    pub cart: CartView,
    pub details: OrderDetails,
    pub errors: Vec<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "order_success.html")]
pub struct OrderSuccessTemplate {
    pub visitor: Visitor,
    pub order: OrderConfirmation,
}

/// Map the gate failures shared by both checkout steps to their redirects.
fn gate_redirect(err: &CheckoutError) -> Option<Redirect> {
    match err {
        CheckoutError::Unauthenticated => Some(Redirect::to("/login")),
        CheckoutError::EmptyCart | CheckoutError::InvalidTransition { .. } => {
            Some(Redirect::to("/"))
        }
        _ => None,
    }
}

/// Display the checkout form.
#[instrument(skip(state, session, visitor))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
) -> Result<Response> {
    match state.checkout().enter_checkout(&session).await {
        Ok(page) => Ok(CheckoutTemplate {
            visitor,
            customer: page.customer,
            cart: page.cart,
            details: OrderDetails::default(),
            errors: Vec::new(),
        }
        .into_response()),
        Err(e) => gate_redirect(&e).map_or_else(|| Err(e.into()), |r| Ok(r.into_response())),
    }
}

/// Place the order.
///
/// Missing fields re-render the form with the submitted values and a 422.
#[instrument(skip(state, session, visitor, details))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
    Form(details): Form<OrderDetails>,
) -> Result<Response> {
    match state.checkout().place_order(&session, details.clone()).await {
        Ok(order) => {
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("reference", order.reference.to_string().as_str())]),
            );
            Ok(OrderSuccessTemplate {
                visitor: visitor.with_empty_cart(),
                order,
            }
            .into_response())
        }
        Err(CheckoutError::Validation(fields)) => {
            let page = state.checkout().enter_checkout(&session).await?;
            let errors = fields
                .iter()
                .map(|field| format!("Please enter your {}.", field.label()))
                .collect();

            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutTemplate {
                    visitor,
                    customer: page.customer,
                    cart: page.cart,
                    details,
                    errors,
                },
            )
                .into_response())
        }
        Err(e) => gate_redirect(&e).map_or_else(|| Err(e.into()), |r| Ok(r.into_response())),
    }
}
