//! Order id generation and the Midtrans transaction id format.
//!
//! Internal order ids are plain UUID v4 strings. The id presented to
//! Midtrans is `belibeli-trx-{internal_id}`: the notification handler
//! parses this exact format to recover the internal id, so the prefix
//! must never change once transactions exist.

use uuid::Uuid;

/// Prefix for every transaction id sent to Midtrans.
pub const TRANSACTION_ID_PREFIX: &str = "belibeli-trx-";

/// Generates a new internal order id.
pub fn gen_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Derives the Midtrans transaction id from an internal order id.
pub fn midtrans_order_id(internal_id: &str) -> String {
    format!("{}{}", TRANSACTION_ID_PREFIX, internal_id)
}

/// Recovers the internal order id from a Midtrans transaction id.
///
/// This is a cheap format check to reject garbage before hitting the
/// database. Returns `None` if the prefix is missing or the remainder is
/// not a UUID.
pub fn parse_midtrans_order_id(s: &str) -> Option<&str> {
    let raw = s.strip_prefix(TRANSACTION_ID_PREFIX)?;
    Uuid::parse_str(raw).ok()?;
    Some(raw)
}
