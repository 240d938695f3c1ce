pub mod checkout;
pub mod orders;
pub mod repay;
pub mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};

use crate::db::AppState;

/// Storefront API routes. Caller identity comes from the upstream auth
/// layer; webhook routes live in `webhooks::router`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/repay", post(repay::repay))
        .route("/api/orders", get(orders::list_my_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route(
            "/api/orders/by-transaction/{midtrans_order_id}",
            get(orders::get_order_by_transaction),
        )
        .route("/admin/orders", get(orders::list_all_orders))
}
