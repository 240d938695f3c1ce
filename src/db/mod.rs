mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use std::sync::Arc;

use crate::payments::{PaymentGateway, SignatureVerifier};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Outbound gateway client, injected so tests can substitute a double.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Inbound notification signature check.
    pub verifier: SignatureVerifier,
    pub base_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
