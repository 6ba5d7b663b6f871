use axum::Router;

pub mod categories;
pub mod products;
pub mod system;

/// Router for the versioned catalog endpoints (mounted under `/api/v1`).
pub fn router() -> Router {
    Router::new()
        .nest("/categories", categories::router())
        .nest("/products", products::router())
}

/// Parse a path id, reporting failures as `InvalidId`.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = warehouse_core::DomainError>,
{
    raw.parse().map_err(crate::app::errors::domain_error_to_response)
}
