//! Sensor persistence: registration, controlled updates, event history and
//! the per-block latest-reading projection.
//!
//! Registration and update pair the sensor write with its derived
//! `sensor_events` row inside one transaction; a sensor mutation is never
//! visible without its event, nor the reverse. Events are append-only:
//! nothing in this module (or anywhere else) updates or deletes them.

use sqlx::PgPool;
use tracing::debug;

use crate::{BlockReading, Error, NewSensor, Sensor, SensorEvent, SensorPatch, SensorStatus};

// ---

/// Look up one sensor by its internal id.
pub async fn get_sensor(pool: &PgPool, sensor_id: i32) -> Result<Option<Sensor>, Error> {
    // ---
    let sensor = sqlx::query_as::<_, Sensor>(
        r#"
        SELECT id, mac_id, block, status
        FROM sensors
        WHERE id = $1
        "#,
    )
    .bind(sensor_id)
    .fetch_optional(pool)
    .await?;

    Ok(sensor)
}

/// Look up one sensor by its normalized device address.
pub async fn get_sensor_by_mac(pool: &PgPool, mac_id: &str) -> Result<Option<Sensor>, Error> {
    // ---
    let sensor = sqlx::query_as::<_, Sensor>(
        r#"
        SELECT id, mac_id, block, status
        FROM sensors
        WHERE mac_id = $1
        "#,
    )
    .bind(mac_id)
    .fetch_optional(pool)
    .await?;

    Ok(sensor)
}

/// List sensors, optionally filtered by block and/or status.
pub async fn list_sensors(
    pool: &PgPool,
    block: Option<&str>,
    status: Option<SensorStatus>,
) -> Result<Vec<Sensor>, Error> {
    // ---
    let sensors = sqlx::query_as::<_, Sensor>(
        r#"
        SELECT id, mac_id, block, status
        FROM sensors
        WHERE ($1::text IS NULL OR block = $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY id
        "#,
    )
    .bind(block)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(sensors)
}

// ---

/// Register a new sensor and record its creation event atomically.
///
/// The device address is normalized before the uniqueness check, so two
/// registrations that only differ in case or separator collide. Both the
/// sensor row and its initial event commit together or not at all.
pub async fn register_sensor(pool: &PgPool, sensor_in: NewSensor) -> Result<Sensor, Error> {
    // ---
    let sensor_in = sensor_in.normalized()?;

    if get_sensor_by_mac(pool, &sensor_in.mac_id).await?.is_some() {
        return Err(Error::Conflict(format!(
            "sensor with MAC {} already exists",
            sensor_in.mac_id
        )));
    }

    let mut tx = pool.begin().await?;

    let sensor = sqlx::query_as::<_, Sensor>(
        r#"
        INSERT INTO sensors (mac_id, block, status)
        VALUES ($1, $2, $3)
        RETURNING id, mac_id, block, status
        "#,
    )
    .bind(&sensor_in.mac_id)
    .bind(&sensor_in.block)
    .bind(sensor_in.status.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        // Concurrent registrations can race past the pre-check; the unique
        // index on mac_id is the authority
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return Error::Conflict(format!(
                    "sensor with MAC {} already exists",
                    sensor_in.mac_id
                ));
            }
        }
        Error::from(e)
    })?;

    sqlx::query(
        r#"
        INSERT INTO sensor_events (sensor_id, status, description)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(sensor.id)
    .bind(sensor.status.as_str())
    .bind("Sensor created")
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!("registered sensor {} ({})", sensor.id, sensor.mac_id);
    Ok(sensor)
}

/// Apply a partial update to a sensor, appending a status-change event when
/// the patch moves it into a different status.
///
/// The row lock taken by `FOR UPDATE` serializes concurrent updates to one
/// sensor, so the prior status captured here cannot go stale before commit.
pub async fn update_sensor(
    pool: &PgPool,
    sensor_id: i32,
    patch: SensorPatch,
) -> Result<Sensor, Error> {
    // ---
    let patch = patch.validated()?;

    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Sensor>(
        r#"
        SELECT id, mac_id, block, status
        FROM sensors
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(sensor_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(Error::NotFound("Sensor"))?;

    let transition = patch.status_transition(current.status);

    let block = patch.block.as_deref().unwrap_or(&current.block);
    let status = patch.status.unwrap_or(current.status);

    let sensor = sqlx::query_as::<_, Sensor>(
        r#"
        UPDATE sensors
        SET block = $2, status = $3
        WHERE id = $1
        RETURNING id, mac_id, block, status
        "#,
    )
    .bind(sensor_id)
    .bind(block)
    .bind(status.as_str())
    .fetch_one(&mut *tx)
    .await?;

    if let Some(next) = transition {
        sqlx::query(
            r#"
            INSERT INTO sensor_events (sensor_id, status, description)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(sensor_id)
        .bind(next.as_str())
        .bind(format!(
            "Status changed from {} to {}",
            current.status, next
        ))
        .execute(&mut *tx)
        .await?;

        debug!("sensor {sensor_id} status {} -> {next}", current.status);
    }

    tx.commit().await?;
    Ok(sensor)
}

// ---

/// Event history for one sensor, newest first (ties broken by id).
pub async fn sensor_events(pool: &PgPool, sensor_id: i32) -> Result<Vec<SensorEvent>, Error> {
    // ---
    let events = sqlx::query_as::<_, SensorEvent>(
        r#"
        SELECT id, sensor_id, status, description, timestamp
        FROM sensor_events
        WHERE sensor_id = $1
        ORDER BY timestamp DESC, id DESC
        "#,
    )
    .bind(sensor_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Events across all sensors, optionally filtered to one status, newest
/// first (ties broken by id).
pub async fn all_events(
    pool: &PgPool,
    status: Option<SensorStatus>,
) -> Result<Vec<SensorEvent>, Error> {
    // ---
    let events = sqlx::query_as::<_, SensorEvent>(
        r#"
        SELECT id, sensor_id, status, description, timestamp
        FROM sensor_events
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY timestamp DESC, id DESC
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(events)
}

// ---

/// Per-block snapshot: every sensor in the block with its most recent
/// measurement, or NULLs for sensors that have not reported yet.
///
/// Greatest-n-per-group with n = 1: the grouped subquery finds each
/// sensor's maximum timestamp, the second LEFT JOIN pulls the matching
/// measurement row. Duplicate maximum timestamps are broken by the highest
/// measurement id, so the projection is deterministic. Rows are ordered by
/// mac_id for stable output.
pub async fn block_readings(pool: &PgPool, block: &str) -> Result<Vec<BlockReading>, Error> {
    // ---
    let readings = sqlx::query_as::<_, BlockReading>(
        r#"
        SELECT
            s.mac_id,
            s.status,
            m.temperature AS last_temperature,
            m.timestamp   AS last_timestamp
        FROM sensors s
        LEFT JOIN (
            SELECT sensor_id, MAX(timestamp) AS max_ts
            FROM measurements
            GROUP BY sensor_id
        ) latest ON latest.sensor_id = s.id
        LEFT JOIN measurements m
            ON m.sensor_id = s.id
           AND m.timestamp = latest.max_ts
           AND m.id = (
               SELECT MAX(id)
               FROM measurements
               WHERE sensor_id = s.id AND timestamp = latest.max_ts
           )
        WHERE s.block = $1
        ORDER BY s.mac_id
        "#,
    )
    .bind(block)
    .fetch_all(pool)
    .await?;

    Ok(readings)
}
