//! Cart route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::parse_product_id;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::services::{CartError, CartView};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub visitor: Visitor,
    pub cart: CartView,
}

/// Display the priced cart.
#[instrument(skip(state, session, visitor))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
) -> Result<impl IntoResponse> {
    let cart = state.cart().view(&session).await?;

    Ok(CartTemplate { visitor, cart })
}

/// Add one unit of a product.
///
/// Unknown products send the visitor home without touching the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let Some(product_id) = parse_product_id(&id) else {
        return Ok(Redirect::to("/").into_response());
    };

    match state.cart().add_item(&session, product_id).await {
        Ok(quantity) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[
                    ("product_id", product_id.to_string().as_str()),
                    ("quantity", quantity.to_string().as_str()),
                ]),
            );
            Ok(Redirect::to("/cart").into_response())
        }
        Err(CartError::NotFound(_)) => Ok(Redirect::to("/").into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Remove one unit of a product.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    if let Some(product_id) = parse_product_id(&id) {
        let quantity = state.cart().remove_item(&session, product_id).await?;
        add_breadcrumb(
            "cart",
            "Removed from cart",
            Some(&[
                ("product_id", product_id.to_string().as_str()),
                ("quantity", quantity.to_string().as_str()),
            ]),
        );
    }

    Ok(Redirect::to("/cart"))
}
