use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    response::IntoResponse,
};

use crate::app::dto::{PriceHistoryResponse, SearchRequest};
use crate::app::errors;
use crate::app::extract::JsonBody;
use crate::app::routes::parse_product_id;
use crate::app::services::AppServices;

/// Price records of one listing. Deleted and sold listings keep their history
/// readable.
pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SearchRequest>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .price_history
        .search(id, body.conditions.as_deref(), body.page.as_ref())
        .await
    {
        Ok(page) => Json(page.map(|h| PriceHistoryResponse::from(&h))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
