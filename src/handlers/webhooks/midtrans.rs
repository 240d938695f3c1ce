//! Midtrans HTTP notification intake.
//!
//! Midtrans delivers notifications at-least-once and without ordering
//! guarantees: the same notification can arrive twice, and a stale
//! `pending` can arrive after a `settlement`. Response codes drive the
//! gateway's retry behavior, so they are chosen deliberately:
//!
//! - 200: processed, including no-ops - stops redelivery
//! - 403: bad signature - retrying can never help
//! - 400: order id the service never issued - retrying can never help
//! - 404: order not visible yet (notification raced checkout's insert) -
//!   Midtrans redelivers later, by which point the insert has landed
//! - 500: transient store failure - Midtrans redelivers later

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use rusqlite::TransactionBehavior;

use crate::db::{queries, AppState};
use crate::id;
use crate::payments::midtrans::{
    next_order_status, FraudStatus, MidtransNotification, TransactionStatus,
};

/// Result type for notification processing.
pub type NotificationResult = (StatusCode, &'static str);

pub async fn handle_midtrans_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    process_notification(&state, &body)
}

fn process_notification(state: &AppState, body: &[u8]) -> NotificationResult {
    let notification: MidtransNotification = match serde_json::from_slice(body) {
        Ok(n) => n,
        Err(e) => {
            tracing::debug!("Unparseable Midtrans notification: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    // Gate on the signature before touching any state.
    if !state.verifier.verify(
        &notification.order_id,
        &notification.status_code,
        &notification.gross_amount,
        &notification.signature_key,
    ) {
        tracing::warn!(
            "Invalid signature on notification for {}",
            notification.order_id
        );
        return (StatusCode::FORBIDDEN, "Invalid signature");
    }

    let Some(internal_id) = id::parse_midtrans_order_id(&notification.order_id) else {
        tracing::warn!("Unrecognized order id format: {}", notification.order_id);
        return (StatusCode::BAD_REQUEST, "Invalid order id format");
    };

    if let Some(ref original) = notification.custom_field1 {
        tracing::debug!(
            "Notification for {} is a retry of transaction {}",
            notification.order_id,
            original
        );
    }

    let status: TransactionStatus = match notification.transaction_status.parse() {
        Ok(s) => s,
        Err(()) => {
            // Midtrans can introduce new statuses; leave the order alone
            // rather than guess.
            tracing::warn!(
                "Unrecognized transaction_status '{}' for {}",
                notification.transaction_status,
                notification.order_id
            );
            return (StatusCode::OK, "Ignored");
        }
    };
    let fraud: Option<FraudStatus> = notification
        .fraud_status
        .as_deref()
        .and_then(|s| s.parse().ok());

    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    // Read and write under one write lock so concurrent notifications for
    // the same order serialize instead of racing the terminal-status check.
    let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
        Ok(tx) => tx,
        Err(e) => {
            tracing::error!("Failed to start transaction: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let order = match queries::get_order_by_id(&tx, internal_id) {
        Ok(Some(o)) => o,
        Ok(None) => {
            // Checkout persists the order after token issuance, so a fast
            // notification can beat the insert.
            tracing::warn!("No order yet for transaction {}", notification.order_id);
            return (StatusCode::NOT_FOUND, "Order not found");
        }
        Err(e) => {
            tracing::error!("DB error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    if let Ok(gross) = notification.gross_amount.parse::<f64>() {
        if gross as i64 != order.total_amount {
            tracing::warn!(
                "gross_amount {} disagrees with stored total {} for order {}",
                notification.gross_amount,
                order.total_amount,
                order.id
            );
        }
    }

    let next = next_order_status(order.status, status, fraud);

    if next != order.status {
        match queries::update_order_status(&tx, &order.id, next) {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                tracing::error!("Failed to update status for order {}", order.id);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
            }
        }
        tracing::info!(
            "Order {} moved {} -> {} ({})",
            order.id,
            order.status,
            next,
            notification.transaction_status
        );
    } else {
        tracing::info!(
            "Order {} unchanged at {} ({})",
            order.id,
            order.status,
            notification.transaction_status
        );
    }

    if let Err(e) = tx.commit() {
        tracing::error!("Failed to commit status update: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
    }

    (StatusCode::OK, "OK")
}
