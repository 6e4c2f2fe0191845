use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::error_response;
use crate::models::wallet::WalletInfoResponse;
use crate::services::AppState;

pub async fn wallet_info(State(state): State<AppState>) -> Response {
    tracing::info!("walletinfo start");

    match state.negotiator.balance().await {
        Ok(balance) => {
            let response = WalletInfoResponse { balance };
            tracing::info!("<< {:?}", response);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error getting wallet info: {}", e);
            error_response(&e)
        }
    }
}
