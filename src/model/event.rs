// Earthquake origin
// Immutable event record shared read-only across a processing batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    /// Catalog id (e.g., "ci38457511")
    pub id: String,
    /// Origin time
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Hypocentral depth in km
    pub depth_km: f64,
    pub magnitude: f64,
    /// Magnitude scale (e.g., "Mw", "ml")
    pub magnitude_type: String,
}

impl ScalarEvent {
    pub fn new(
        id: impl Into<String>,
        time: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        depth_km: f64,
        magnitude: f64,
    ) -> Self {
        ScalarEvent {
            id: id.into(),
            time,
            latitude,
            longitude,
            depth_km,
            magnitude,
            magnitude_type: "Mw".to_string(),
        }
    }

    pub fn with_magnitude_type(mut self, magnitude_type: impl Into<String>) -> Self {
        self.magnitude_type = magnitude_type.into();
        self
    }
}
