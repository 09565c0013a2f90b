//! Sensor endpoints: registration, listing, detail, update, measurement
//! ingestion, event history and the per-block latest-reading view.
//!
//! Handlers stay thin (EMBP): extraction and response shaping happen here,
//! all SQL and transition rules live behind the `store` gateway. Typed
//! failures convert to responses through `Error: IntoResponse`, so every
//! handler is a plain `?` chain.

use axum::{
    extract::Path, extract::Query, extract::State, http::StatusCode, response::IntoResponse,
    routing::get, routing::post, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::{
    store, BlockReading, Error, NewMeasurement, NewSensor, Sensor, SensorDetail, SensorEvent,
    SensorPatch, SensorStatus,
};

// ---

pub fn router() -> Router<PgPool> {
    // ---
    Router::new()
        .route("/sensors", post(create_sensor).get(list_sensors))
        .route("/sensors/events/all", get(all_events))
        .route(
            "/sensors/{sensor_id}",
            get(sensor_detail).patch(update_sensor),
        )
        .route("/sensors/{sensor_id}/measurements", post(create_measurement))
        .route("/sensors/{sensor_id}/history", get(sensor_history))
        .route("/blocks/{block}/readings", get(block_readings))
}

// ---

/// Handle `POST /sensors`.
///
/// Registers a device; the initial event is recorded in the same
/// transaction. 201 on success, 400 on a duplicate address, 422 on a
/// malformed one.
async fn create_sensor(
    State(pool): State<PgPool>,
    Json(sensor_in): Json<NewSensor>,
) -> Result<impl IntoResponse, Error> {
    // ---
    info!("POST /sensors - mac {}", sensor_in.mac_id);

    let sensor = store::register_sensor(&pool, sensor_in).await?;
    Ok((StatusCode::CREATED, Json(sensor)))
}

/// Query parameters for `GET /sensors`.
#[derive(Debug, Deserialize)]
struct ListQuery {
    block: Option<String>,
    status: Option<SensorStatus>,
}

async fn list_sensors(
    State(pool): State<PgPool>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Sensor>>, Error> {
    // ---
    let sensors = store::list_sensors(&pool, params.block.as_deref(), params.status).await?;
    Ok(Json(sensors))
}

/// Query parameters for `GET /sensors/{sensor_id}`.
///
/// When either bound is present the range wins and `limit` is ignored.
#[derive(Debug, Deserialize)]
struct DetailQuery {
    limit: Option<i64>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

async fn sensor_detail(
    State(pool): State<PgPool>,
    Path(sensor_id): Path<i32>,
    Query(params): Query<DetailQuery>,
) -> Result<Json<SensorDetail>, Error> {
    // ---
    let sensor = store::get_sensor(&pool, sensor_id)
        .await?
        .ok_or(Error::NotFound("Sensor"))?;

    let measurements = store::measurements_for_sensor(
        &pool,
        sensor_id,
        params.limit.unwrap_or(store::DEFAULT_HISTORY_LIMIT),
        params.start_time,
        params.end_time,
    )
    .await?;

    Ok(Json(SensorDetail {
        sensor,
        measurements,
    }))
}

/// Handle `PATCH /sensors/{sensor_id}`.
///
/// Absent fields stay untouched; a status change appends one event.
async fn update_sensor(
    State(pool): State<PgPool>,
    Path(sensor_id): Path<i32>,
    Json(patch): Json<SensorPatch>,
) -> Result<Json<Sensor>, Error> {
    // ---
    info!("PATCH /sensors/{sensor_id}");

    let sensor = store::update_sensor(&pool, sensor_id, patch).await?;
    Ok(Json(sensor))
}

/// Handle `POST /sensors/{sensor_id}/measurements` (device-facing).
async fn create_measurement(
    State(pool): State<PgPool>,
    Path(sensor_id): Path<i32>,
    Json(measurement_in): Json<NewMeasurement>,
) -> Result<impl IntoResponse, Error> {
    // ---
    let measurement = store::insert_measurement(&pool, sensor_id, measurement_in).await?;
    Ok((StatusCode::CREATED, Json(measurement)))
}

async fn sensor_history(
    State(pool): State<PgPool>,
    Path(sensor_id): Path<i32>,
) -> Result<Json<Vec<SensorEvent>>, Error> {
    // ---
    store::get_sensor(&pool, sensor_id)
        .await?
        .ok_or(Error::NotFound("Sensor"))?;

    let events = store::sensor_events(&pool, sensor_id).await?;
    Ok(Json(events))
}

/// Query parameters for `GET /sensors/events/all`.
#[derive(Debug, Deserialize)]
struct EventsQuery {
    status: Option<SensorStatus>,
}

async fn all_events(
    State(pool): State<PgPool>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<Vec<SensorEvent>>, Error> {
    // ---
    let events = store::all_events(&pool, params.status).await?;
    Ok(Json(events))
}

async fn block_readings(
    State(pool): State<PgPool>,
    Path(block): Path<String>,
) -> Result<Json<Vec<BlockReading>>, Error> {
    // ---
    let readings = store::block_readings(&pool, &block).await?;
    Ok(Json(readings))
}
