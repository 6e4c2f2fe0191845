use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::{error_response, params::RequestParams};
use crate::models::offer::UserSendResponse;
use crate::services::AppState;

pub async fn offer(State(state): State<AppState>, params: RequestParams) -> Response {
    tracing::info!("offer start: {:?}", params.0);

    let request = params
        .single("asset")
        .and_then(|asset| params.amount("cost").map(|cost| (asset.to_string(), cost)));
    let (asset, cost) = match request {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Bad offer request: {}", e);
            return error_response(&e);
        }
    };

    match state.negotiator.request_offers(&asset, cost).await {
        Ok(table) => {
            tracing::info!("<< {:?}", table);
            (StatusCode::OK, Json(table)).into_response()
        }
        Err(e) => {
            tracing::error!("Error requesting offers: {}", e);
            error_response(&e)
        }
    }
}

pub async fn send(State(state): State<AppState>, params: RequestParams) -> Response {
    tracing::info!("send start: {:?}", params.0);

    let request = params
        .single("id")
        .and_then(|id| params.single("addr").map(|addr| (id.to_string(), addr.to_string())));
    let (offer_id, addr) = match request {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Bad send request: {}", e);
            return send_response(StatusCode::BAD_REQUEST, false, e.to_string());
        }
    };

    match state.orchestrator.send(&offer_id, &addr).await {
        Ok(receipt) => send_response(
            StatusCode::OK,
            true,
            format!("success ADDR:{} TxID:{}", addr, receipt.txid),
        ),
        Err(e) => send_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            false,
            format!("fail ADDR:{} TxID:{}\nerr:{}", addr, offer_id, e),
        ),
    }
}

fn send_response(status: StatusCode, result: bool, message: String) -> Response {
    let response = UserSendResponse { result, message };
    tracing::info!("<< {:?}", response);
    (status, Json(response)).into_response()
}
