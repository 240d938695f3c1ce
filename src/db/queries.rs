use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{query_all, query_one, ORDER_COLS, PRODUCT_COLS, PROFILE_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Map a unique-constraint failure on insert to `Conflict`; anything else
/// stays a database error.
fn map_insert_err(e: rusqlite::Error, what: &str) -> AppError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
            AppError::Conflict(format!("{} already exists", what))
        }
        _ => e.into(),
    }
}

// ============ Orders ============

/// Insert a fully-built order row.
///
/// The caller constructs the `Order` (ids included) before insertion
/// because the transaction id must be presented to the gateway first.
/// Fails with `Conflict` if either the internal or the Midtrans id is
/// already taken.
pub fn insert_order(conn: &Connection, order: &Order) -> Result<()> {
    conn.execute(
        "INSERT INTO orders (id, midtrans_order_id, user_id, total_amount, status, items, customer_details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &order.id,
            &order.midtrans_order_id,
            &order.user_id,
            order.total_amount,
            order.status.as_str(),
            serde_json::to_string(&order.items)?,
            serde_json::to_string(&order.customer_details)?,
            order.created_at,
        ],
    )
    .map_err(|e| map_insert_err(e, "order"))?;
    Ok(())
}

pub fn get_order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

pub fn get_order_by_midtrans_id(
    conn: &Connection,
    midtrans_order_id: &str,
) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE midtrans_order_id = ?1",
            ORDER_COLS
        ),
        &[&midtrans_order_id],
    )
}

/// Set an order's status in a single write.
///
/// This applies unconditionally; the non-regression rules live in
/// `payments::midtrans::next_order_status`, which callers must consult
/// first (under the same transaction as the read, see the notification
/// handler). Returns false if no such order exists.
pub fn update_order_status(conn: &Connection, id: &str, status: OrderStatus) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(affected > 0)
}

/// Remove an order row. Compensating cleanup only: never valid once a
/// notification for the order's transaction id may have been dispatched.
pub fn delete_order(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn list_orders_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Order>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC",
            ORDER_COLS
        ),
        &[&user_id],
    )
}

pub fn list_orders(conn: &Connection) -> Result<Vec<Order>> {
    query_all(
        conn,
        &format!("SELECT {} FROM orders ORDER BY created_at DESC", ORDER_COLS),
        &[],
    )
}

// ============ Products ============

pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    let id = Uuid::new_v4().to_string();
    let now = now();

    conn.execute(
        "INSERT INTO products (id, name, price, image_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, &input.name, input.price, &input.image_url, now],
    )
    .map_err(|e| map_insert_err(e, "product"))?;

    Ok(Product {
        id,
        name: input.name.clone(),
        price: input.price,
        image_url: input.image_url.clone(),
        created_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    query_all(
        conn,
        &format!("SELECT {} FROM products ORDER BY name", PRODUCT_COLS),
        &[],
    )
}

// ============ Profiles ============

pub fn upsert_profile(
    conn: &Connection,
    user_id: &str,
    display_name: &str,
    email: &str,
) -> Result<Profile> {
    let now = now();
    conn.execute(
        "INSERT INTO profiles (user_id, display_name, email, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET display_name = ?2, email = ?3",
        params![user_id, display_name, email, now],
    )?;

    get_profile(conn, user_id)?
        .ok_or_else(|| AppError::Internal("Profile missing after upsert".into()))
}

pub fn get_profile(conn: &Connection, user_id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE user_id = ?1", PROFILE_COLS),
        &[&user_id],
    )
}
