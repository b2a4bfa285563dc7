use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    #[serde(default = "default_method")]
    pub payment_method: String,
}

fn default_method() -> String {
    "alipay".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentIntent {
    pub payment_no: String,
    pub order_id: Uuid,
    pub payment_method: String,
    pub amount: i64,
    pub payment_url: String,
    pub qr_code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentCallbackRequest {
    pub payment_no: String,
    pub order_id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResult {
    pub order_id: Uuid,
    pub payment_no: String,
    pub status: String,
}
