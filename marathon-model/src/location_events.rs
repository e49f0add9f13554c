use crate::ids::{RunnerId, RunnerNumber};
use crate::runner::{GeoPoint, RunnerRecord, RunnerStatus};

/// Out-of-band position/status update pushed by the live feed.
///
/// Producers identify the runner by `runnerId`, `runnerNumber`, or both.
/// An unrecognised `status` string is treated as absent rather than
/// rejecting the whole event, so the position still lands.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LocationEvent {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runner_id: Option<RunnerId>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runner_number: Option<RunnerNumber>,
    pub location: GeoPoint,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "lenient_status"
        )
    )]
    pub status: Option<RunnerStatus>,
}

impl LocationEvent {
    pub fn for_id(id: RunnerId, location: GeoPoint) -> Self {
        Self {
            runner_id: Some(id),
            runner_number: None,
            location,
            status: None,
        }
    }

    pub fn for_number(number: RunnerNumber, location: GeoPoint) -> Self {
        Self {
            runner_id: None,
            runner_number: Some(number),
            location,
            status: None,
        }
    }

    pub fn with_status(mut self, status: RunnerStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// True when the event carries neither identity and can never match.
    pub fn is_anonymous(&self) -> bool {
        self.runner_id.is_none() && self.runner_number.is_none()
    }

    pub fn targets_id(&self, record: &RunnerRecord) -> bool {
        self.runner_id.as_ref() == Some(&record.id)
    }

    pub fn targets_number(&self, record: &RunnerRecord) -> bool {
        self.runner_number.as_ref() == Some(&record.runner_number)
    }
}

#[cfg(feature = "serde")]
fn lenient_status<'de, D>(
    deserializer: D,
) -> Result<Option<RunnerStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn decodes_number_only_event() {
        let event: LocationEvent = serde_json::from_str(
            r#"{"runnerNumber": 17, "location": {"coordinates": [31.0, -17.8]}}"#,
        )
        .unwrap();

        assert!(event.runner_id.is_none());
        assert_eq!(event.runner_number, Some(RunnerNumber::new("17")));
        assert!(event.status.is_none());
    }

    #[test]
    fn unknown_status_is_dropped_not_fatal() {
        let event: LocationEvent = serde_json::from_str(
            r#"{"runnerId": "r1", "location": {"coordinates": [0.0, 0.0]}, "status": "sprinting"}"#,
        )
        .unwrap();

        assert_eq!(event.runner_id, Some(RunnerId::new("r1")));
        assert!(event.status.is_none());
    }

    #[test]
    fn known_status_is_kept() {
        let event: LocationEvent = serde_json::from_str(
            r#"{"runnerId": "r1", "location": {"coordinates": [0.0, 0.0]}, "status": "completed"}"#,
        )
        .unwrap();

        assert_eq!(event.status, Some(RunnerStatus::Completed));
    }
}
