use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::id;
use crate::middleware::AuthUser;
use crate::models::{CustomerDetails, LineItem, Order, OrderStatus};
use crate::payments::TokenRequest;

/// Cart contents as submitted by the storefront.
///
/// The cart UI also sends `name` and `price` display fields per item;
/// those are dropped on deserialization and pricing is re-resolved from
/// the catalog.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub id: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub token: String,
    pub order_id: String,
}

pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    if request.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let conn = state.db.get()?;

    let profile = queries::get_profile(&conn, &user.id)?
        .ok_or_else(|| AppError::NotFound("Customer profile not found".into()))?;
    let customer = CustomerDetails {
        display_name: profile.display_name,
        email: profile.email,
    };

    // Price every line from the catalog, snapshotting the unit price onto
    // the order.
    let mut items = Vec::with_capacity(request.items.len());
    for item in &request.items {
        if item.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "Invalid quantity for product {}",
                item.id
            )));
        }
        let product = queries::get_product_by_id(&conn, &item.id)?
            .ok_or_else(|| AppError::NotFound(format!("Product not found: {}", item.id)))?;
        items.push(LineItem {
            product_id: product.id,
            name: product.name,
            price: product.price,
            quantity: item.quantity,
        });
    }

    let total_amount: i64 = items.iter().map(LineItem::subtotal).sum();
    if total_amount <= 0 {
        return Err(AppError::BadRequest("Order total must be positive".into()));
    }

    let order_id = id::gen_order_id();
    let midtrans_order_id = id::midtrans_order_id(&order_id);

    // Token first, then persist. A gateway failure here leaves nothing to
    // clean up; an insert failure afterwards orphans the token, which can
    // never settle against a real order.
    let snap = state
        .gateway
        .create_transaction_token(&TokenRequest {
            order_id: midtrans_order_id.clone(),
            gross_amount: total_amount,
            items: items.clone(),
            customer: customer.clone(),
            finish_redirect_url: Some(format!("{}/order/{}", state.base_url, order_id)),
            original_order_id: None,
        })
        .await?;

    let order = Order {
        id: order_id,
        midtrans_order_id,
        user_id: user.id,
        total_amount,
        status: OrderStatus::Pending,
        items,
        customer_details: customer,
        created_at: chrono::Utc::now().timestamp(),
    };

    queries::insert_order(&conn, &order).map_err(|e| {
        tracing::error!(
            "Failed to persist order {} after token issuance, token is orphaned: {}",
            order.id,
            e
        );
        e
    })?;

    tracing::info!(
        "Checkout created order {} for {} (total {})",
        order.id,
        order.user_id,
        order.total_amount
    );

    Ok(Json(CheckoutResponse {
        token: snap.token,
        order_id: order.id,
    }))
}
