use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payments::{CreatePaymentRequest, PaymentCallbackRequest, PaymentIntent, PaymentResult},
    error::{AppResult, ErrorData},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment))
        .route("/callback", post(payment_callback))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Mock payment intent", body = ApiResponse<PaymentIntent>),
        (status = 404, description = "Order not found", body = ApiResponse<ErrorData>),
        (status = 409, description = "Order is not awaiting payment", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentIntent>>> {
    let resp = payment_service::create_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/callback",
    request_body = PaymentCallbackRequest,
    responses(
        (status = 200, description = "Order marked paid", body = ApiResponse<PaymentResult>),
        (status = 402, description = "Gateway reported failure", body = ApiResponse<ErrorData>),
        (status = 409, description = "Order is not pending", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PaymentCallbackRequest>,
) -> AppResult<Json<ApiResponse<PaymentResult>>> {
    let resp = payment_service::payment_callback(&state, &user, payload).await?;
    Ok(Json(resp))
}
