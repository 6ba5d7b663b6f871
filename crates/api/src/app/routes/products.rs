use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use warehouse_core::ProductId;

use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/parents", post(create_parent).get(list_parents))
        .route(
            "/parents/:id",
            get(get_parent).patch(update_parent).delete(delete_parent),
        )
        .route("/parents/:id/variants", post(create_variant))
        .route("/variants", get(list_variants))
        .route(
            "/variants/:id",
            get(get_variant).patch(update_variant).delete(delete_variant),
        )
}

// -------- parents --------

pub async fn create_parent(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateParentRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    let (input, dropped) = body.into_domain();
    if !dropped.is_empty() {
        tracing::debug!(?dropped, "dropped fields not allowed on a parent");
    }

    match services.products.create_parent(input).await {
        Ok(parent) => (StatusCode::CREATED, Json(dto::ParentOut::from(parent))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_parents(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.products.list_parents().await {
        Ok(list) => {
            let out: Vec<dto::ParentOut> = list.into_iter().map(dto::ParentOut::from).collect();
            Json(out).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_parent(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.get_parent_with_variants(id).await {
        Ok(pv) => Json(dto::ParentWithVariantsOut::from(pv)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_parent(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    let patch = match body.into_patch() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.products.update_parent(id, patch).await {
        Ok(parent) => Json(dto::ParentOut::from(parent)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_parent(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.delete_parent(id).await {
        Ok(variants_deleted) => Json(serde_json::json!({
            "deleted": true,
            "variants_deleted": variants_deleted,
        }))
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

// -------- variants --------

pub async fn create_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(parent_id): Path<String>,
    body: Result<Json<dto::CreateVariantRequest>, JsonRejection>,
) -> axum::response::Response {
    let parent_id: ProductId = match parse_id(&parent_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    let (input, dropped) = match body.into_domain() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if !dropped.is_empty() {
        tracing::debug!(%parent_id, ?dropped, "dropped fields not allowed on a variant");
    }

    match services.products.create_variant(parent_id, input).await {
        Ok(variant) => (StatusCode::CREATED, Json(dto::VariantOut::from(variant))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_variants(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.products.list_variants().await {
        Ok(list) => {
            let out: Vec<dto::VariantOut> = list.into_iter().map(dto::VariantOut::from).collect();
            Json(out).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.get_variant(id).await {
        Ok(variant) => Json(dto::VariantOut::from(variant)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    let patch = match body.into_patch() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.products.update_variant(id, patch).await {
        Ok(variant) => Json(dto::VariantOut::from(variant)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.delete_variant(id).await {
        Ok(()) => Json(serde_json::json!({ "deleted": true })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
