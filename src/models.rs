//! Data models for the sensor telemetry service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{mac, Error};

// ---

/// Physically plausible temperature range accepted on ingestion, in °C.
pub const MIN_TEMPERATURE_C: f64 = -273.15;
pub const MAX_TEMPERATURE_C: f64 = 1000.0;

/// Maximum length of a block name.
const MAX_BLOCK_LEN: usize = 50;

// ---

/// Operating status of a sensor.
///
/// A closed three-value set; stored as TEXT, with [`TryFrom`] guarding the
/// decode path so an unknown value can never round-trip through the API.
/// Any status may transition to any other; transitions are recorded in the
/// event log, never rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorStatus {
    #[default]
    Normal,
    Error,
    Maintenance,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            SensorStatus::Normal => "NORMAL",
            SensorStatus::Error => "ERROR",
            SensorStatus::Maintenance => "MAINTENANCE",
        }
    }
}

impl std::fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SensorStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s {
            "NORMAL" => Ok(SensorStatus::Normal),
            "ERROR" => Ok(SensorStatus::Error),
            "MAINTENANCE" => Ok(SensorStatus::Maintenance),
            other => Err(Error::Validation(format!(
                "unknown sensor status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for SensorStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

// ---

/// A registered device belonging to a physical block.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Sensor {
    // ---
    pub id: i32,
    pub mac_id: String,
    pub block: String,
    #[sqlx(try_from = "String")]
    pub status: SensorStatus,
}

/// One temperature reading tied to a sensor.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Measurement {
    // ---
    pub id: i32,
    pub sensor_id: i32,
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

/// Immutable record of a status entered by a sensor at a point in time.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SensorEvent {
    // ---
    pub id: i32,
    pub sensor_id: i32,
    #[sqlx(try_from = "String")]
    pub status: SensorStatus,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the per-block latest-reading projection. Sensors without any
/// measurement appear with both `last_*` fields null.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BlockReading {
    // ---
    pub mac_id: String,
    #[sqlx(try_from = "String")]
    pub status: SensorStatus,
    pub last_temperature: Option<f64>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

/// Sensor plus its most recent measurements, for the detail endpoint.
#[derive(Debug, Serialize)]
pub struct SensorDetail {
    // ---
    #[serde(flatten)]
    pub sensor: Sensor,
    pub measurements: Vec<Measurement>,
}

// ---

/// Registration input for a new sensor. Status defaults to `NORMAL` when
/// the caller leaves it out.
#[derive(Debug, Deserialize)]
pub struct NewSensor {
    // ---
    pub mac_id: String,
    pub block: String,
    #[serde(default)]
    pub status: SensorStatus,
}

impl NewSensor {
    /// Canonicalize the device address and check the block name.
    pub fn normalized(mut self) -> Result<Self, Error> {
        // ---
        self.mac_id = mac::normalize_mac(&self.mac_id)?;
        validate_block(&self.block)?;
        Ok(self)
    }
}

/// Partial update for a sensor. Fields absent from the patch are left
/// untouched; only a status value different from the stored one produces
/// an event.
#[derive(Debug, Default, Deserialize)]
pub struct SensorPatch {
    // ---
    pub block: Option<String>,
    pub status: Option<SensorStatus>,
}

impl SensorPatch {
    /// The status this patch would move a sensor into, when that differs
    /// from `current`. `None` means no event is due.
    pub fn status_transition(&self, current: SensorStatus) -> Option<SensorStatus> {
        // ---
        match self.status {
            Some(next) if next != current => Some(next),
            _ => None,
        }
    }

    /// Check the fields that are present.
    pub fn validated(self) -> Result<Self, Error> {
        // ---
        if let Some(ref block) = self.block {
            validate_block(block)?;
        }
        Ok(self)
    }
}

/// Ingestion input for one reading. Timestamp defaults to ingestion time.
#[derive(Debug, Deserialize)]
pub struct NewMeasurement {
    // ---
    pub temperature: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewMeasurement {
    /// Reject readings outside the plausible temperature range.
    pub fn validated(self) -> Result<Self, Error> {
        // ---
        if !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&self.temperature) {
            return Err(Error::Validation(format!(
                "temperature {} outside range [{MIN_TEMPERATURE_C}, {MAX_TEMPERATURE_C}]",
                self.temperature
            )));
        }
        Ok(self)
    }
}

fn validate_block(block: &str) -> Result<(), Error> {
    // ---
    if block.is_empty() || block.len() > MAX_BLOCK_LEN {
        return Err(Error::Validation(format!(
            "block must be 1-{MAX_BLOCK_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_status_round_trip() {
        // ---
        for status in [
            SensorStatus::Normal,
            SensorStatus::Error,
            SensorStatus::Maintenance,
        ] {
            assert_eq!(status.as_str().parse::<SensorStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        // ---
        assert!(matches!(
            "BROKEN".parse::<SensorStatus>(),
            Err(Error::Validation(_))
        ));
        // Case-sensitive; the store only ever holds uppercase
        assert!("normal".parse::<SensorStatus>().is_err());
    }

    #[test]
    fn test_new_sensor_status_defaults_to_normal() {
        // ---
        let sensor_in: NewSensor =
            serde_json::from_str(r#"{"mac_id": "AA:BB:CC:11:22:33", "block": "B1"}"#).unwrap();
        assert_eq!(sensor_in.status, SensorStatus::Normal);
    }

    #[test]
    fn test_normalized_canonicalizes_mac() {
        // ---
        let sensor_in = NewSensor {
            mac_id: "aa-bb-cc-11-22-33".to_string(),
            block: "B1".to_string(),
            status: SensorStatus::Normal,
        };
        assert_eq!(sensor_in.normalized().unwrap().mac_id, "AA:BB:CC:11:22:33");
    }

    #[test]
    fn test_block_bounds() {
        // ---
        let make = |block: &str| NewSensor {
            mac_id: "AA:BB:CC:11:22:33".to_string(),
            block: block.to_string(),
            status: SensorStatus::Normal,
        };

        assert!(make("").normalized().is_err());
        assert!(make(&"B".repeat(50)).normalized().is_ok());
        assert!(make(&"B".repeat(51)).normalized().is_err());
    }

    #[test]
    fn test_status_transition_on_change() {
        // ---
        let patch = SensorPatch {
            block: None,
            status: Some(SensorStatus::Error),
        };
        assert_eq!(
            patch.status_transition(SensorStatus::Normal),
            Some(SensorStatus::Error)
        );
    }

    #[test]
    fn test_no_transition_on_same_status() {
        // ---
        let patch = SensorPatch {
            block: None,
            status: Some(SensorStatus::Normal),
        };
        assert_eq!(patch.status_transition(SensorStatus::Normal), None);
    }

    #[test]
    fn test_no_transition_on_block_only_patch() {
        // ---
        let patch = SensorPatch {
            block: Some("B2".to_string()),
            status: None,
        };
        assert_eq!(patch.status_transition(SensorStatus::Error), None);
    }

    #[test]
    fn test_patch_absent_fields_deserialize_to_none() {
        // ---
        let patch: SensorPatch = serde_json::from_str(r#"{"block": "B2"}"#).unwrap();
        assert_eq!(patch.block.as_deref(), Some("B2"));
        assert!(patch.status.is_none());
    }

    #[test]
    fn test_temperature_bounds() {
        // ---
        let make = |temperature: f64| NewMeasurement {
            temperature,
            timestamp: None,
        };

        // Inclusive at both ends
        assert!(make(MIN_TEMPERATURE_C).validated().is_ok());
        assert!(make(MAX_TEMPERATURE_C).validated().is_ok());
        assert!(make(MIN_TEMPERATURE_C - 0.01).validated().is_err());
        assert!(make(MAX_TEMPERATURE_C + 0.01).validated().is_err());
        assert!(make(21.5).validated().is_ok());
    }
}
