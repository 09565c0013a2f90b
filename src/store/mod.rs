//! Persistence gateway for the telemetry store (EMBP).
//!
//! Each sibling module owns the SQL for one entity family; this gateway
//! re-exports the operations the routes consume, so route modules never
//! reach into a sibling directly.

mod measurements;
mod sensors;

// ---

pub use measurements::{
    delete_measurement, insert_measurement, measurements_for_sensor, DEFAULT_HISTORY_LIMIT,
};
pub use sensors::{
    all_events, block_readings, get_sensor, get_sensor_by_mac, list_sensors, register_sensor,
    sensor_events, update_sensor,
};
