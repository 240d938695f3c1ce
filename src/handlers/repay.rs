use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::id;
use crate::middleware::AuthUser;
use crate::models::{Order, OrderStatus};
use crate::payments::TokenRequest;

/// The storefront posts back the order it wants to retry. Only the id is
/// trusted; everything else is re-read from the store.
#[derive(Debug, Deserialize)]
pub struct RepayRequest {
    pub order: OrderRef,
}

#[derive(Debug, Deserialize)]
pub struct OrderRef {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct RepayResponse {
    pub token: String,
    pub order_id: String,
}

pub async fn repay(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RepayRequest>,
) -> Result<Json<RepayResponse>> {
    let conn = state.db.get()?;

    let original = queries::get_order_by_id(&conn, &request.order.id)?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if original.user_id != user.id {
        return Err(AppError::Forbidden("Order belongs to another user".into()));
    }
    if original.status == OrderStatus::Success {
        return Err(AppError::Conflict("Order is already paid".into()));
    }

    // Midtrans rejects transaction id reuse, so a retry is a fresh order
    // row with a fresh id pair. The original row stays behind as the
    // record of the abandoned attempt; the old transaction id rides along
    // on the token request for traceability.
    let order_id = id::gen_order_id();
    let midtrans_order_id = id::midtrans_order_id(&order_id);

    let snap = state
        .gateway
        .create_transaction_token(&TokenRequest {
            order_id: midtrans_order_id.clone(),
            gross_amount: original.total_amount,
            items: original.items.clone(),
            customer: original.customer_details.clone(),
            finish_redirect_url: Some(format!("{}/order/{}", state.base_url, order_id)),
            original_order_id: Some(original.midtrans_order_id.clone()),
        })
        .await?;

    let order = Order {
        id: order_id,
        midtrans_order_id,
        user_id: original.user_id.clone(),
        total_amount: original.total_amount,
        status: OrderStatus::Pending,
        items: original.items.clone(),
        customer_details: original.customer_details.clone(),
        created_at: chrono::Utc::now().timestamp(),
    };

    queries::insert_order(&conn, &order).map_err(|e| {
        tracing::error!(
            "Failed to persist repay order {} after token issuance, token is orphaned: {}",
            order.id,
            e
        );
        e
    })?;

    tracing::info!(
        "Repay minted order {} for original order {}",
        order.id,
        original.id
    );

    Ok(Json(RepayResponse {
        token: snap.token,
        order_id: order.id,
    }))
}
