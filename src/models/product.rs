use serde::{Deserialize, Serialize};

/// A catalog product. The catalog is managed elsewhere; this service only
/// reads it to price checkout requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Unit price in the smallest currency unit.
    pub price: i64,
    pub image_url: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}
