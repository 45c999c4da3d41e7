use axum::http::StatusCode;
use axum::response::IntoResponse;

#[allow(clippy::unused_async)]
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}
