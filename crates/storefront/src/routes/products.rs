//! Product detail route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use super::parse_product_id;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::models::product::Product;
use crate::state::AppState;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub visitor: Visitor,
    pub product: Product,
}

/// Display a single product, or send the visitor home if it doesn't exist.
#[instrument(skip(state, visitor))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Response> {
    let Some(id) = parse_product_id(&id) else {
        return Ok(Redirect::to("/").into_response());
    };

    let Some(product) = state.catalog().find_product(id).await? else {
        tracing::debug!(product_id = %id, "product not found, redirecting home");
        return Ok(Redirect::to("/").into_response());
    };

    add_breadcrumb(
        "navigation",
        "Viewed product",
        Some(&[("product_id", id.to_string().as_str())]),
    );

    Ok(ProductTemplate { visitor, product }.into_response())
}
