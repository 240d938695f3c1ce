//! Midtrans Snap integration: token creation, notification verification,
//! and the mapping from gateway transaction statuses to order statuses.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::OrderStatus;

use super::{PaymentGateway, SnapToken, TokenRequest};

/// Upper bound on a Snap API call. A gateway that hangs past this is
/// treated the same as an explicit token failure.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct CreateTokenResponse {
    token: String,
    #[serde(default)]
    redirect_url: Option<String>,
}

/// HTTP client for the Midtrans Snap API.
#[derive(Debug, Clone)]
pub struct MidtransClient {
    client: Client,
    server_key: String,
    base_url: String,
}

impl MidtransClient {
    /// `base_url` selects the environment, e.g.
    /// `https://app.sandbox.midtrans.com` or `https://app.midtrans.com`.
    pub fn new(server_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(GATEWAY_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            server_key: server_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for MidtransClient {
    async fn create_transaction_token(&self, request: &TokenRequest) -> Result<SnapToken> {
        let item_details: Vec<_> = request
            .items
            .iter()
            .map(|item| {
                json!({
                    "id": item.product_id,
                    "price": item.price,
                    "quantity": item.quantity,
                    "name": item.name,
                })
            })
            .collect();

        let mut body = json!({
            "transaction_details": {
                "order_id": request.order_id,
                "gross_amount": request.gross_amount,
            },
            "item_details": item_details,
            "customer_details": {
                "first_name": request.customer.display_name,
                "email": request.customer.email,
            },
        });
        if let Some(ref finish) = request.finish_redirect_url {
            body["callbacks"] = json!({ "finish": finish });
        }
        if let Some(ref original) = request.original_order_id {
            body["custom_field1"] = json!(original);
        }

        let response = self
            .client
            .post(format!("{}/snap/v1/transactions", self.base_url))
            .basic_auth(&self.server_key, None::<&str>)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Snap API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Snap API returned {}: {}",
                status, error_text
            )));
        }

        let token: CreateTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse Snap response: {}", e)))?;

        Ok(SnapToken {
            token: token.token,
            redirect_url: token.redirect_url,
        })
    }
}

/// Verifies that a notification originated from Midtrans.
///
/// The documented scheme is a hex-encoded SHA-512 over the concatenation
/// `order_id + status_code + gross_amount + server_key`, with no
/// delimiters. Field order and the raw string forms must match the wire
/// values exactly.
#[derive(Clone)]
pub struct SignatureVerifier {
    server_key: String,
}

impl SignatureVerifier {
    pub fn new(server_key: &str) -> Self {
        Self {
            server_key: server_key.to_string(),
        }
    }

    pub fn verify(
        &self,
        order_id: &str,
        status_code: &str,
        gross_amount: &str,
        signature: &str,
    ) -> bool {
        let mut hasher = Sha512::new();
        hasher.update(order_id.as_bytes());
        hasher.update(status_code.as_bytes());
        hasher.update(gross_amount.as_bytes());
        hasher.update(self.server_key.as_bytes());
        let expected = hex::encode(hasher.finalize());

        // Length is not secret (always 128 hex chars for SHA-512), so the
        // early return does not leak anything useful.
        let expected_bytes = expected.as_bytes();
        let provided_bytes = signature.as_bytes();
        if expected_bytes.len() != provided_bytes.len() {
            return false;
        }

        expected_bytes.ct_eq(provided_bytes).into()
    }
}

/// Payload of a Midtrans HTTP notification.
///
/// `gross_amount` and `status_code` stay as strings: signature
/// verification must use the exact wire form, not a re-serialization.
#[derive(Debug, Deserialize)]
pub struct MidtransNotification {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    /// Original transaction id, echoed back for repay attempts.
    #[serde(default)]
    pub custom_field1: Option<String>,
}

/// Transaction statuses this service acts on.
///
/// Midtrans may add statuses over time; anything unrecognized is left to
/// the caller to log and ignore rather than guess at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Settlement,
    Capture,
    Pending,
    Deny,
    Expire,
    Cancel,
    Failure,
}

impl std::str::FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "settlement" => Ok(Self::Settlement),
            "capture" => Ok(Self::Capture),
            "pending" => Ok(Self::Pending),
            "deny" => Ok(Self::Deny),
            "expire" => Ok(Self::Expire),
            "cancel" => Ok(Self::Cancel),
            "failure" => Ok(Self::Failure),
            _ => Err(()),
        }
    }
}

/// Fraud screening verdict attached to card (`capture`) notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudStatus {
    Accept,
    Challenge,
    Deny,
}

impl std::str::FromStr for FraudStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Self::Accept),
            "challenge" => Ok(Self::Challenge),
            "deny" => Ok(Self::Deny),
            _ => Err(()),
        }
    }
}

/// Computes the order status a notification moves an order to.
///
/// A terminal current status always wins: Midtrans redelivers
/// notifications and may deliver them out of order, so a stale `pending`
/// after a `settlement`, or a replayed duplicate, must leave the order
/// untouched. A `capture` only counts as paid with an explicit fraud
/// `accept`.
pub fn next_order_status(
    current: OrderStatus,
    status: TransactionStatus,
    fraud: Option<FraudStatus>,
) -> OrderStatus {
    if current.is_terminal() {
        return current;
    }

    match status {
        TransactionStatus::Settlement => OrderStatus::Success,
        TransactionStatus::Capture => match fraud {
            Some(FraudStatus::Accept) => OrderStatus::Success,
            _ => OrderStatus::Failure,
        },
        TransactionStatus::Pending => current,
        TransactionStatus::Deny
        | TransactionStatus::Expire
        | TransactionStatus::Cancel
        | TransactionStatus::Failure => OrderStatus::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus::*;

    #[test]
    fn test_settlement_completes_pending_order() {
        assert_eq!(
            next_order_status(Pending, TransactionStatus::Settlement, None),
            Success
        );
    }

    #[test]
    fn test_capture_requires_fraud_accept() {
        assert_eq!(
            next_order_status(
                Pending,
                TransactionStatus::Capture,
                Some(FraudStatus::Accept)
            ),
            Success
        );
        assert_eq!(
            next_order_status(Pending, TransactionStatus::Capture, Some(FraudStatus::Deny)),
            Failure
        );
        assert_eq!(
            next_order_status(
                Pending,
                TransactionStatus::Capture,
                Some(FraudStatus::Challenge)
            ),
            Failure
        );
        // No fraud verdict at all: do not treat the charge as paid.
        assert_eq!(
            next_order_status(Pending, TransactionStatus::Capture, None),
            Failure
        );
    }

    #[test]
    fn test_pending_is_a_noop() {
        assert_eq!(
            next_order_status(Pending, TransactionStatus::Pending, None),
            Pending
        );
    }

    #[test]
    fn test_failure_statuses() {
        for status in [
            TransactionStatus::Deny,
            TransactionStatus::Expire,
            TransactionStatus::Cancel,
            TransactionStatus::Failure,
        ] {
            assert_eq!(next_order_status(Pending, status, None), Failure);
        }
    }

    #[test]
    fn test_terminal_status_never_regresses() {
        // Stale pending after settlement
        assert_eq!(
            next_order_status(Success, TransactionStatus::Pending, None),
            Success
        );
        // Out-of-order deny after settlement
        assert_eq!(
            next_order_status(Success, TransactionStatus::Deny, None),
            Success
        );
        // Late settlement after the transaction already expired
        assert_eq!(
            next_order_status(Failure, TransactionStatus::Settlement, None),
            Failure
        );
    }

    #[test]
    fn test_duplicate_delivery_is_idempotent() {
        let first = next_order_status(Pending, TransactionStatus::Settlement, None);
        let second = next_order_status(first, TransactionStatus::Settlement, None);
        assert_eq!(first, Success);
        assert_eq!(second, Success);
    }

    #[test]
    fn test_verifier_accepts_documented_scheme() {
        let verifier = SignatureVerifier::new("server-key");
        let expected = {
            let mut hasher = Sha512::new();
            hasher.update(b"belibeli-trx-abc");
            hasher.update(b"200");
            hasher.update(b"20000.00");
            hasher.update(b"server-key");
            hex::encode(hasher.finalize())
        };

        assert!(verifier.verify("belibeli-trx-abc", "200", "20000.00", &expected));
    }

    #[test]
    fn test_verifier_rejects_wrong_key_and_tampered_fields() {
        let verifier = SignatureVerifier::new("server-key");
        let other = SignatureVerifier::new("other-key");
        let signature = {
            let mut hasher = Sha512::new();
            hasher.update(b"belibeli-trx-abc");
            hasher.update(b"200");
            hasher.update(b"20000.00");
            hasher.update(b"other-key");
            hex::encode(hasher.finalize())
        };

        assert!(other.verify("belibeli-trx-abc", "200", "20000.00", &signature));
        assert!(!verifier.verify("belibeli-trx-abc", "200", "20000.00", &signature));
        // Signature over a different amount must not verify
        assert!(!other.verify("belibeli-trx-abc", "200", "99999.00", &signature));
        assert!(!verifier.verify("belibeli-trx-abc", "200", "20000.00", "not-hex"));
        assert!(!verifier.verify("belibeli-trx-abc", "200", "20000.00", ""));
    }
}
