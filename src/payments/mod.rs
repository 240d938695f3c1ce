pub mod midtrans;

pub use midtrans::{MidtransClient, SignatureVerifier};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{CustomerDetails, LineItem};

/// Outbound side of the payment gateway.
///
/// Orchestrators receive this as a trait object so tests can substitute a
/// double without touching the network.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests a payment token for a not-yet-paid transaction.
    async fn create_transaction_token(&self, request: &TokenRequest) -> Result<SnapToken>;
}

/// Everything the gateway needs to open a payment page for one transaction.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    /// Transaction id as presented to the gateway (`belibeli-trx-{id}`).
    /// The gateway rejects reuse, so repay attempts mint a fresh one.
    pub order_id: String,
    pub gross_amount: i64,
    pub items: Vec<LineItem>,
    pub customer: CustomerDetails,
    /// Where the payment page sends the customer after completion.
    pub finish_redirect_url: Option<String>,
    /// For repay attempts: the transaction id of the order being retried.
    /// Echoed back by the gateway in notifications for traceability.
    pub original_order_id: Option<String>,
}

/// Token issued by the gateway for a pending transaction.
#[derive(Debug, Clone)]
pub struct SnapToken {
    pub token: String,
    pub redirect_url: Option<String>,
}
