use axum::{http::StatusCode, response::IntoResponse};

/// Undocumented root route, answers with the service name only.
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, env!("CARGO_PKG_NAME"))
}
