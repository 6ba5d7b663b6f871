use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use warehouse_catalog::{CategoryPatch, NewCategory};
use warehouse_core::CategoryId;

use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).patch(update_category).delete(delete_category),
        )
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateCategoryRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.categories.create(NewCategory::from(body)).await {
        Ok(category) => (StatusCode::CREATED, Json(dto::CategoryOut::from(category))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.categories.list().await {
        Ok(list) => {
            let out: Vec<dto::CategoryOut> = list.into_iter().map(dto::CategoryOut::from).collect();
            Json(out).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.categories.get(id).await {
        Ok(category) => Json(dto::CategoryOut::from(category)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateCategoryRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: CategoryId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.categories.update(id, CategoryPatch::from(body)).await {
        Ok(category) => Json(dto::CategoryOut::from(category)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.categories.delete(id).await {
        Ok(()) => Json(serde_json::json!({ "deleted": true })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
