//! Database schema management for `blocksense-api`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `sensors`, `measurements` and `sensor_events` tables plus
/// the indexes backing the common lookups. Safe to call on every startup;
/// no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Registered devices; mac_id is the external identity
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensors (
            id     SERIAL PRIMARY KEY,
            mac_id TEXT NOT NULL UNIQUE,
            block  TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'NORMAL'
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Temperature readings, one row per ingestion
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS measurements (
            id          SERIAL PRIMARY KEY,
            sensor_id   INTEGER NOT NULL REFERENCES sensors (id),
            temperature DOUBLE PRECISION NOT NULL,
            timestamp   TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Append-only status history; rows are never updated or deleted
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_events (
            id          SERIAL PRIMARY KEY,
            sensor_id   INTEGER NOT NULL REFERENCES sensors (id),
            status      TEXT NOT NULL,
            description TEXT NOT NULL,
            timestamp   TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensors_block
            ON sensors (block);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_measurements_sensor_id
            ON measurements (sensor_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_measurements_timestamp
            ON measurements (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_events_sensor_id
            ON sensor_events (sensor_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
