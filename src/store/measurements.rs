//! Measurement persistence: ingestion, deletion and history queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{Error, Measurement, NewMeasurement};

// ---

/// Number of measurements the detail query returns when no time range and
/// no explicit limit is given.
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

// ---

/// Store one reading for an existing sensor.
///
/// The timestamp defaults to ingestion time when the device did not supply
/// one.
pub async fn insert_measurement(
    pool: &PgPool,
    sensor_id: i32,
    measurement_in: NewMeasurement,
) -> Result<Measurement, Error> {
    // ---
    let measurement_in = measurement_in.validated()?;

    super::sensors::get_sensor(pool, sensor_id)
        .await?
        .ok_or(Error::NotFound("Sensor"))?;

    let timestamp = measurement_in.timestamp.unwrap_or_else(Utc::now);

    let measurement = sqlx::query_as::<_, Measurement>(
        r#"
        INSERT INTO measurements (sensor_id, temperature, timestamp)
        VALUES ($1, $2, $3)
        RETURNING id, sensor_id, temperature, timestamp
        "#,
    )
    .bind(sensor_id)
    .bind(measurement_in.temperature)
    .bind(timestamp)
    .fetch_one(pool)
    .await?;

    Ok(measurement)
}

/// Discard one reading. Returns false when the id is unknown.
pub async fn delete_measurement(pool: &PgPool, measurement_id: i32) -> Result<bool, Error> {
    // ---
    let result = sqlx::query("DELETE FROM measurements WHERE id = $1")
        .bind(measurement_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Measurement history for one sensor, newest first (ties broken by id).
///
/// A time-ranged query returns everything inside the range; only the
/// unbounded query is capped, at `limit` rows. Range queries prioritize
/// completeness, default queries recency.
pub async fn measurements_for_sensor(
    pool: &PgPool,
    sensor_id: i32,
    limit: i64,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
) -> Result<Vec<Measurement>, Error> {
    // ---
    let measurements = if start_time.is_some() || end_time.is_some() {
        sqlx::query_as::<_, Measurement>(
            r#"
            SELECT id, sensor_id, temperature, timestamp
            FROM measurements
            WHERE sensor_id = $1
              AND ($2::timestamptz IS NULL OR timestamp >= $2)
              AND ($3::timestamptz IS NULL OR timestamp <= $3)
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(sensor_id)
        .bind(start_time)
        .bind(end_time)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, Measurement>(
            r#"
            SELECT id, sensor_id, temperature, timestamp
            FROM measurements
            WHERE sensor_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(sensor_id)
        .bind(limit)
        .fetch_all(pool)
        .await?
    };

    Ok(measurements)
}
