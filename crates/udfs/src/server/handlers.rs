//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{ErrorResponse, HealthResponse, InvokeRequest, InvokeResponse},
    UdfError,
};
use tracing::warn;
use udfs::UdfFunction;

use super::state::AppState;

/// `POST /invoke` — run one function over a batch of argument rows.
///
/// Answers with one value per row, in order, or a single error for the whole
/// batch.
pub async fn invoke(State(state): State<AppState>, Json(req): Json<InvokeRequest>) -> Response {
    let function = match req.function.parse::<UdfFunction>() {
        Ok(f) => f,
        Err(e) => return error_response(&e),
    };

    if req.rows.len() > state.max_batch_rows {
        let err = ErrorResponse::new(
            "batch_too_large",
            format!(
                "batch has {} rows; at most {} are accepted",
                req.rows.len(),
                state.max_batch_rows
            ),
        );
        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
    }

    match state.udfs.invoke_batch(function, &req.rows).await {
        Ok(values) => (StatusCode::OK, Json(InvokeResponse { values })).into_response(),
        Err(e) => {
            warn!(function = %function, code = e.code(), error = %e, "udf invocation failed");
            error_response(&e)
        }
    }
}

/// `GET /health` — liveness check with key-cache size.
pub async fn health(State(state): State<AppState>) -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        secrets_cached: state.udfs.secrets().len().await,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn error_response(err: &UdfError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}
