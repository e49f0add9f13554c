use marathon_core::console_prelude::{RunnerId, RunnerRecord, RunnerStatus};

const NOT_PROVIDED: &str = "Not provided";
const COORDINATE_PRECISION: usize = 6;

/// Display-ready view of a single runner
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerDetail {
    pub runner_id: RunnerId,
    pub name: String,
    pub runner_number: String,
    pub status: RunnerStatus,
    pub status_label: &'static str,
    pub categories: String,
    pub email: String,
    pub phone: String,
    /// e.g. "March 1, 2025"
    pub registered_on: String,
    /// "lat, lon"; `None` when no location has been reported
    pub coordinates: Option<String>,
}

impl RunnerDetail {
    pub fn from_record(record: &RunnerRecord) -> Self {
        let categories = if record.registered_categories.is_empty() {
            "None".to_string()
        } else {
            record
                .registered_categories
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            runner_id: record.id.clone(),
            name: record.name.clone(),
            runner_number: record.runner_number.to_string(),
            status: record.status,
            status_label: record.status.label(),
            categories,
            email: or_not_provided(record.email.as_deref()),
            phone: or_not_provided(record.phone.as_deref()),
            registered_on: record.created_at.format("%B %-d, %Y").to_string(),
            coordinates: record
                .last_known_location
                .as_ref()
                .map(|point| point.format_lat_lon(COORDINATE_PRECISION)),
        }
    }

    /// Label of the status toggle action: "Complete" for active runners,
    /// "Activate" otherwise
    pub fn toggle_action(&self) -> &'static str {
        match self.status {
            RunnerStatus::Active => "Complete",
            _ => "Activate",
        }
    }
}

fn or_not_provided(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_PROVIDED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marathon_core::console_prelude::{GeoPoint, RunnerNumber};
    use marathon_model::chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn record() -> RunnerRecord {
        RunnerRecord {
            id: RunnerId::new("r1"),
            runner_number: RunnerNumber::new("M-017"),
            name: "Tariro Moyo".into(),
            email: None,
            phone: Some("  ".into()),
            status: RunnerStatus::Active,
            registered_categories: BTreeSet::new(),
            last_known_location: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let detail = RunnerDetail::from_record(&record());

        assert_eq!(detail.email, "Not provided");
        assert_eq!(detail.phone, "Not provided");
        assert_eq!(detail.categories, "None");
        assert_eq!(detail.coordinates, None);
        assert_eq!(detail.registered_on, "March 1, 2025");
        assert_eq!(detail.status_label, "Active");
        assert_eq!(detail.toggle_action(), "Complete");
    }

    #[test]
    fn coordinates_are_lat_first_with_six_decimals() {
        let mut record = record();
        record.last_known_location = Some(GeoPoint::new(31.05, -17.8).unwrap());
        record.registered_categories =
            BTreeSet::from(["42km".to_string(), "21km".to_string()]);

        let detail = RunnerDetail::from_record(&record);

        assert_eq!(
            detail.coordinates.as_deref(),
            Some("-17.800000, 31.050000")
        );
        assert_eq!(detail.categories, "21km, 42km");
    }
}
