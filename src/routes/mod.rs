use axum::Router;
use sqlx::PgPool;

mod health;
mod measurements;
mod sensors;

// ---

pub fn router(pool: PgPool) -> Router {
    // ---
    Router::new()
        .merge(sensors::router())
        .merge(measurements::router())
        .merge(health::router())
        .with_state(pool)
}
