use axum::{Router, routing::get};

use carshop_core::ProductId;

use crate::app::errors;

pub mod price_history;
pub mod products;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/whoami", get(system::whoami))
        .nest("/api/products", products::router())
        .merge(users::router())
}

pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse::<ProductId>()
        .map_err(errors::domain_error_to_response)
}
