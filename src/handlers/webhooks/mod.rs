pub mod midtrans;

pub use midtrans::handle_midtrans_notification;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/midtrans", post(handle_midtrans_notification))
}
