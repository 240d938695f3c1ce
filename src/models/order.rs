use serde::{Deserialize, Serialize};

/// A customer order, keyed both by its internal id and by the transaction
/// id presented to Midtrans.
///
/// Line items and customer details are snapshotted at creation time: later
/// catalog price changes or profile edits must not retroactively affect an
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Transaction id presented to Midtrans (`belibeli-trx-{id}`).
    /// Unique and immutable once set; notifications are correlated by it.
    pub midtrans_order_id: String,
    pub user_id: String,
    /// Total in the smallest currency unit, computed server-side from
    /// the line items. Never taken from the request.
    pub total_amount: i64,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub customer_details: CustomerDetails,
    pub created_at: i64,
}

/// One catalog item in an order, with the unit price at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
}

impl LineItem {
    pub fn subtotal(&self) -> i64 {
        self.price * self.quantity as i64
    }
}

/// Customer contact details captured when the order was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub display_name: String,
    pub email: String,
}

/// Payment status of an order.
///
/// `Pending` is the initial state; `Success` and `Failure` are terminal.
/// Transitions are driven exclusively by gateway notifications (see
/// `payments::midtrans::next_order_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Success,
    Failure,
}

impl OrderStatus {
    /// Terminal statuses are never overwritten by later notifications.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
