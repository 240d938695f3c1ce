use axum::extract::State;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthUser;
use crate::models::Order;

/// Orders belonging to the calling user, newest first.
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>> {
    let conn = state.db.get()?;
    let orders = queries::list_orders_for_user(&conn, &user.id)?;
    Ok(Json(orders))
}

/// A single order by internal id. Owners see their own orders; admins see
/// everything.
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let conn = state.db.get()?;
    let order = queries::get_order_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if order.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden("Order belongs to another user".into()));
    }

    Ok(Json(order))
}

/// A single order by its Midtrans transaction id. Used by the payment
/// redirect landing page, which only knows the id it sent to the gateway.
pub async fn get_order_by_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(midtrans_order_id): Path<String>,
) -> Result<Json<Order>> {
    let conn = state.db.get()?;
    let order = queries::get_order_by_midtrans_id(&conn, &midtrans_order_id)?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if order.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden("Order belongs to another user".into()));
    }

    Ok(Json(order))
}

/// All orders, for the admin dashboard.
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>> {
    user.require_admin()?;

    let conn = state.db.get()?;
    let orders = queries::list_orders(&conn)?;
    Ok(Json(orders))
}
