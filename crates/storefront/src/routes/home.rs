//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Visitor;
use crate::models::product::Product;
use crate::state::AppState;

/// Home page template: the full catalog.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub visitor: Visitor,
    pub products: Vec<Product>,
}

/// Display the product listing.
#[instrument(skip(state, visitor))]
pub async fn index(State(state): State<AppState>, visitor: Visitor) -> Result<impl IntoResponse> {
    let products = state.catalog().list_products().await?;

    Ok(IndexTemplate { visitor, products })
}
