use chrono::{Duration, Utc};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    audit,
    dto::payments::{CreatePaymentRequest, PaymentCallbackRequest, PaymentIntent, PaymentResult},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    order_status::OrderStatus,
    response::{ApiResponse, Meta},
    services::order_service::{find_user_order, transition_order},
    state::AppState,
};

const CALLBACK_SUCCESS: &str = "success";

/// Issues a mock payment intent for one of the caller's pending orders.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<PaymentIntent>> {
    let order = find_user_order(&state.orm, user.user_id, payload.order_id).await?;
    let status: OrderStatus = order.status.parse()?;
    if status != OrderStatus::Pending {
        return Err(AppError::InvalidTransition {
            from: status,
            to: OrderStatus::Paid,
        });
    }

    let payment_no = build_payment_no();
    let gateway = state.config.payment_gateway_url.trim_end_matches('/');
    let intent = PaymentIntent {
        payment_url: format!("{gateway}/pay/{payment_no}"),
        qr_code: format!("{gateway}/qr/{payment_no}"),
        expires_at: Utc::now() + Duration::minutes(state.config.payment_expire_minutes),
        payment_no,
        order_id: order.id,
        payment_method: payload.payment_method,
        amount: order.total_amount,
    };

    tracing::info!(
        order_id = %order.id,
        payment_no = %intent.payment_no,
        amount = intent.amount,
        "payment intent created"
    );
    Ok(ApiResponse::success(
        "Payment created",
        intent,
        Some(Meta::empty()),
    ))
}

/// Applies the gateway's verdict to a pending order. Only `success` moves it to paid.
pub async fn payment_callback(
    state: &AppState,
    user: &AuthUser,
    payload: PaymentCallbackRequest,
) -> AppResult<ApiResponse<PaymentResult>> {
    if payload.payment_no.trim().is_empty() {
        return Err(AppError::BadRequest("payment_no is required".into()));
    }

    let order = find_user_order(&state.orm, user.user_id, payload.order_id).await?;
    let status: OrderStatus = order.status.parse()?;
    if status != OrderStatus::Pending {
        return Err(AppError::InvalidTransition {
            from: status,
            to: OrderStatus::Paid,
        });
    }

    if payload.status != CALLBACK_SUCCESS {
        tracing::warn!(
            order_id = %order.id,
            payment_no = %payload.payment_no,
            status = %payload.status,
            "payment reported failure"
        );
        return Err(AppError::PaymentFailed);
    }

    let txn = state.orm.begin().await?;
    let order = transition_order(&txn, order.id, OrderStatus::Paid, None).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id, "payment_no": payload.payment_no }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment success",
        PaymentResult {
            order_id: order.id,
            payment_no: payload.payment_no,
            status: order.status,
        },
        Some(Meta::empty()),
    ))
}

/// `PAY` + UTC timestamp to the second + six random digits.
pub fn build_payment_no() -> String {
    let suffix = Uuid::new_v4().as_u128() % 1_000_000;
    format!("PAY{}{:06}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}
