use serde::{Deserialize, Serialize};

/// Customer profile, maintained by the auth collaborator. Checkout reads
/// it to snapshot customer details onto the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub created_at: i64,
}
