pub mod exchange;
pub mod params;
pub mod wallet;

use std::path::Path;

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::error::NodeError;
use crate::services::AppState;

/// Builds the HTTP surface. Unrouted paths fall through to `static_dir`
/// when one is given.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/walletinfo", get(wallet::wallet_info).post(wallet::wallet_info))
        .route("/offer", post(exchange::offer))
        .route("/send", post(exchange::send))
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http()).layer(cors)
}

pub(crate) fn error_response(e: &NodeError) -> Response {
    let status = if e.is_request_format() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}
