use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                clerk_id        TEXT NOT NULL UNIQUE,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL,
                role            TEXT NOT NULL,
                phone           TEXT,
                location        TEXT,
                organization    TEXT,
                bio             TEXT,
                latitude        REAL,
                longitude       REAL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE saved_crops (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                crop_id     TEXT NOT NULL,
                saved_at    TEXT NOT NULL,
                PRIMARY KEY (user_id, crop_id)
            );

            -- Flat layout: offer_type decides which of buyer_id / provider_id is set.
            CREATE TABLE offers (
                id                  TEXT PRIMARY KEY,
                offer_type          TEXT NOT NULL DEFAULT 'crop',
                farmer_id           TEXT NOT NULL REFERENCES users(id),
                buyer_id            TEXT REFERENCES users(id),
                provider_id         TEXT REFERENCES users(id),
                crop_id             TEXT,
                service_request_id  TEXT,
                buyer_need_id       TEXT,
                price_per_unit      REAL,
                quantity_requested  REAL,
                bid_amount          TEXT,
                message             TEXT,
                status              TEXT NOT NULL DEFAULT 'pending',
                created_at          TEXT NOT NULL
            );

            CREATE INDEX idx_offers_farmer ON offers(farmer_id);
            CREATE INDEX idx_offers_buyer ON offers(buyer_id);
            CREATE INDEX idx_offers_provider ON offers(provider_id);

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                sender_id       TEXT NOT NULL REFERENCES users(id),
                receiver_id     TEXT NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                read            INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_messages_pair
                ON messages(sender_id, receiver_id, created_at);
            CREATE INDEX idx_messages_unread
                ON messages(receiver_id, sender_id, read);

            CREATE TABLE rentals (
                id              TEXT PRIMARY KEY,
                farmer_id       TEXT NOT NULL REFERENCES users(id),
                name            TEXT NOT NULL,
                kind            TEXT NOT NULL,
                price_per_hour  REAL NOT NULL,
                description     TEXT,
                image           TEXT,
                status          TEXT NOT NULL DEFAULT 'available',
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_rentals_farmer ON rentals(farmer_id, created_at);

            CREATE TABLE buyer_needs (
                id              TEXT PRIMARY KEY,
                buyer_id        TEXT NOT NULL REFERENCES users(id),
                crop_name       TEXT NOT NULL,
                quantity        REAL NOT NULL,
                unit            TEXT NOT NULL DEFAULT 'kg',
                min_price       REAL NOT NULL,
                max_price       REAL NOT NULL,
                description     TEXT,
                deadline        TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'active',
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_buyer_needs_buyer ON buyer_needs(buyer_id, created_at);

            CREATE TABLE tasks (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title           TEXT NOT NULL,
                date            TEXT NOT NULL,
                kind            TEXT NOT NULL DEFAULT 'general',
                status          TEXT NOT NULL DEFAULT 'pending',
                description     TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_tasks_user ON tasks(user_id, date);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
