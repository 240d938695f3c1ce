use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use belibeli::config::Config;
use belibeli::db::{create_pool, init_db, queries, AppState};
use belibeli::handlers;
use belibeli::models::CreateProduct;
use belibeli::payments::{MidtransClient, SignatureVerifier};

#[derive(Parser, Debug)]
#[command(name = "belibeli")]
#[command(about = "Storefront API: checkout, repay, and Midtrans payment reconciliation")]
struct Cli {
    /// Seed the database with dev data (catalog products and a demo profile)
    #[arg(long)]
    seed: bool,
}

/// Seeds the database with dev catalog data for local testing.
/// Only runs in dev mode and when the catalog is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_products(&conn).expect("Failed to list products");
    if !existing.is_empty() {
        tracing::info!("Catalog already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let products = [
        ("Kopi Gayo 250g", 55_000),
        ("Teh Melati 100g", 28_000),
        ("Gula Aren 500g", 35_000),
    ];
    for (name, price) in products {
        let product = queries::create_product(
            &conn,
            &CreateProduct {
                name: name.to_string(),
                price,
                image_url: None,
            },
        )
        .expect("Failed to create dev product");
        tracing::info!("Product: {} (id: {}, price: {})", product.name, product.id, product.price);
    }

    let profile = queries::upsert_profile(
        &conn,
        "dev-user",
        "Dev User",
        "dev@belibeli.local",
    )
    .expect("Failed to create dev profile");
    tracing::info!("Profile: {} ({})", profile.display_name, profile.user_id);

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "belibeli=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.midtrans_server_key.is_empty() {
        tracing::warn!("MIDTRANS_SERVER_KEY is not set - token creation and notification verification will fail");
    }

    // Create the database pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        gateway: Arc::new(MidtransClient::new(
            &config.midtrans_server_key,
            &config.midtrans_base_url,
        )),
        verifier: SignatureVerifier::new(&config.midtrans_server_key),
        base_url: config.base_url.clone(),
    };

    // Seed dev data if --seed is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set BELIBELI_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Build the application router
    let app = Router::new()
        .merge(handlers::api_router())
        .merge(handlers::webhooks::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("BeliBeli server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
