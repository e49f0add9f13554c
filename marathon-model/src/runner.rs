use crate::chrono::{DateTime, Utc};
use crate::error::{ModelError, Result};
use crate::ids::{RunnerId, RunnerNumber};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Participation state of a runner as tracked by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum RunnerStatus {
    #[default]
    Registered,
    Active,
    Completed,
    Inactive,
}

impl RunnerStatus {
    pub fn all() -> &'static [RunnerStatus] {
        use RunnerStatus::*;
        &[Registered, Active, Completed, Inactive]
    }

    /// Wire and query-string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerStatus::Registered => "registered",
            RunnerStatus::Active => "active",
            RunnerStatus::Completed => "completed",
            RunnerStatus::Inactive => "inactive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunnerStatus::Registered => "Registered",
            RunnerStatus::Active => "Active",
            RunnerStatus::Completed => "Completed",
            RunnerStatus::Inactive => "Inactive",
        }
    }

    /// The status the console's one-click action moves a runner to:
    /// active runners are completed, everyone else is activated.
    pub fn toggled(&self) -> RunnerStatus {
        match self {
            RunnerStatus::Active => RunnerStatus::Completed,
            _ => RunnerStatus::Active,
        }
    }
}

impl fmt::Display for RunnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunnerStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registered" => Ok(RunnerStatus::Registered),
            "active" => Ok(RunnerStatus::Active),
            "completed" => Ok(RunnerStatus::Completed),
            "inactive" => Ok(RunnerStatus::Inactive),
            _ => Err(ModelError::InvalidStatus(s.to_string())),
        }
    }
}

/// GeoJSON-style point, `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct GeoPoint {
    #[cfg_attr(
        feature = "serde",
        serde(rename = "type", default, skip_serializing_if = "Option::is_none")
    )]
    pub kind: Option<String>,
    pub coordinates: [f64; 2],
    /// When the position was observed, if the producer reported it.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        let point = GeoPoint {
            kind: Some("Point".to_string()),
            coordinates: [longitude, latitude],
            timestamp: None,
        };
        point.validate()?;
        Ok(point)
    }

    pub fn with_timestamp(mut self, observed_at: DateTime<Utc>) -> Self {
        self.timestamp = Some(observed_at);
        self
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn validate(&self) -> Result<()> {
        let (lon, lat) = (self.longitude(), self.latitude());
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat)
        {
            return Err(ModelError::InvalidCoordinates {
                longitude: lon.to_string(),
                latitude: lat.to_string(),
            });
        }
        Ok(())
    }

    /// `"lat, lon"` rounded to `precision` decimal places.
    pub fn format_lat_lon(&self, precision: usize) -> String {
        format!(
            "{:.prec$}, {:.prec$}",
            self.latitude(),
            self.longitude(),
            prec = precision
        )
    }
}

/// A registered marathon participant as returned by the runners endpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RunnerRecord {
    #[cfg_attr(feature = "serde", serde(rename = "_id"))]
    pub id: RunnerId,
    pub runner_number: RunnerNumber,
    pub name: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub email: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub phone: Option<String>,
    pub status: RunnerStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub registered_categories: BTreeSet<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub last_known_location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

impl RunnerRecord {
    /// Merge a live position (and optionally a status) into this record.
    ///
    /// Identity, contact details, categories and `created_at` are never
    /// touched here.
    pub fn merge_location(
        &mut self,
        location: &GeoPoint,
        status: Option<RunnerStatus>,
    ) {
        self.last_known_location = Some(location.clone());
        if let Some(status) = status {
            self.status = status;
        }
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.registered_categories.contains(category)
    }
}
