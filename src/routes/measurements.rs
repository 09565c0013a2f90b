//! Measurement maintenance endpoint.
//!
//! Sibling module in the `routes` directory (EMBP): internal to this file
//! are the endpoint handler(s); the export to the gateway (`mod.rs`) is a
//! subrouter containing the `/measurements` routes. Ingestion lives on the
//! sensor-scoped path in `sensors.rs`; this file only covers discarding a
//! bad reading.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::delete;
use axum::Router;
use sqlx::PgPool;
use tracing::info;

use crate::{store, Error};

// ---

pub fn router() -> Router<PgPool> {
    // ---
    Router::new().route("/measurements/{measurement_id}", delete(delete_measurement))
}

/// Handle `DELETE /measurements/{measurement_id}`.
///
/// Removes a single bad reading. 204 on success, 404 for an unknown id.
async fn delete_measurement(
    State(pool): State<PgPool>,
    Path(measurement_id): Path<i32>,
) -> Result<StatusCode, Error> {
    // ---
    info!("DELETE /measurements/{measurement_id}");

    if !store::delete_measurement(&pool, measurement_id).await? {
        return Err(Error::NotFound("Measurement"));
    }

    Ok(StatusCode::NO_CONTENT)
}
