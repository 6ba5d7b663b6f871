use axum::{http::StatusCode, Json};

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
