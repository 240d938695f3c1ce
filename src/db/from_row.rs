//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use serde::de::DeserializeOwned;

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted rows.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Parse a JSON text column into its typed form.
fn parse_json<T: DeserializeOwned>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(col)?;
    serde_json::from_str(&raw).map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const ORDER_COLS: &str =
    "id, midtrans_order_id, user_id, total_amount, status, items, customer_details, created_at";

pub const PRODUCT_COLS: &str = "id, name, price, image_url, created_at";

pub const PROFILE_COLS: &str = "user_id, display_name, email, created_at";

// ============ FromRow Implementations ============

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            midtrans_order_id: row.get(1)?,
            user_id: row.get(2)?,
            total_amount: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            items: parse_json(row, 5, "items")?,
            customer_details: parse_json(row, 6, "customer_details")?,
            created_at: row.get(7)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            image_url: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            user_id: row.get(0)?,
            display_name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
