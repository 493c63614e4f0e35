use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use carshop_infra::SearchScope;

use crate::app::dto::{self, ProductResponse, SearchRequest};
use crate::app::errors;
use crate::app::extract::JsonBody;
use crate::app::routes::{parse_product_id, price_history};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product))
        .route("/search", post(search_catalogue))
        .route("/mine/search", post(search_mine))
        .route("/mine/archive/search", post(search_archive))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/:id/restore", patch(restore_product))
        .route("/:id/sell", patch(sell_product))
        .route("/:id/price-history/search", post(price_history::search))
}

async fn search(
    services: &AppServices,
    scope: SearchScope,
    body: SearchRequest,
) -> axum::response::Response {
    match services
        .products
        .search(&scope, body.conditions.as_deref(), body.page.as_ref())
        .await
    {
        Ok(page) => Json(page.map(|p| ProductResponse::from(&p))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Everything currently for sale.
pub async fn search_catalogue(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<SearchRequest>,
) -> axum::response::Response {
    search(&services, SearchScope::Catalogue, body).await
}

/// The caller's live listings, sold ones included.
pub async fn search_mine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<SearchRequest>,
) -> axum::response::Response {
    let scope = SearchScope::OwnerListings(principal.login().clone());
    search(&services, scope, body).await
}

/// Every listing the caller ever created, deleted ones included.
pub async fn search_archive(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<SearchRequest>,
) -> axum::response::Response {
    let scope = SearchScope::OwnerArchive(principal.login().clone());
    search(&services, scope, body).await
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::CreateProductRequest>,
) -> axum::response::Response {
    match services.products.create(principal.login(), body.into()).await {
        Ok(p) => (StatusCode::CREATED, Json(ProductResponse::from(&p))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.find_by_id(id).await {
        Ok(p) => Json(ProductResponse::from(&p)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<dto::UpdateProductRequest>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .products
        .update(id, principal.login(), body.into())
        .await
    {
        Ok(p) => Json(ProductResponse::from(&p)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.delete(id, principal.login()).await {
        Ok(p) => Json(ProductResponse::from(&p)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn restore_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.restore(id, principal.login()).await {
        Ok(p) => Json(ProductResponse::from(&p)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn sell_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.sell(id, principal.login()).await {
        Ok(p) => Json(ProductResponse::from(&p)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
