use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Customer profiles (identity lives in the auth service; this is
        -- the contact-detail mirror used to snapshot orders)
        CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Catalog products (managed by the admin app; read-only here)
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price INTEGER NOT NULL CHECK (price > 0),
            image_url TEXT,
            created_at INTEGER NOT NULL
        );

        -- Orders. items and customer_details are JSON snapshots taken at
        -- creation time; status only ever moves forward (pending is the
        -- sole non-terminal state).
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            midtrans_order_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            total_amount INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'success', 'failure')),
            items TEXT NOT NULL,
            customer_details TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_midtrans ON orders(midtrans_order_id);
        "#,
    )
}
