use marathon_model::chrono::{DateTime, Utc};
use marathon_model::{
    GeoPoint, RunnerPage, RunnerRecord, RunnerStatus,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ===== Response Types =====

/// Envelope every JSON endpoint wraps its payload in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Total matches for list endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Why an envelope did not yield a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("{0}")]
    Rejected(String),

    #[error("Empty response from server")]
    MissingData,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            count: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            count: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Server-provided explanation, preferring `message` over `error`.
    pub fn failure_reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }

    /// Unwrap the payload; `success: false` becomes [`EnvelopeError::Rejected`].
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        if !self.success {
            let reason = self
                .failure_reason()
                .unwrap_or("Invalid response format")
                .to_string();
            return Err(EnvelopeError::Rejected(reason));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }
}

impl ApiResponse<Vec<RunnerRecord>> {
    /// Decode a runners list response into a page.
    ///
    /// A missing `count` falls back to the number of records returned.
    /// Treating it as zero would report no pages while rows are on screen,
    /// and `Pagination::visible_range` would disagree with the records.
    pub fn into_page(self) -> Result<RunnerPage, EnvelopeError> {
        let count = self.count;
        let records = self.into_data()?;
        let total = count.unwrap_or(records.len() as u64);
        Ok(RunnerPage { records, total })
    }
}

// ===== Auth Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` answers with the token at the top level, outside `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Administrator account returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ===== Runner Types =====

/// Body for `PUT /runners/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRunnerRequest {
    pub status: RunnerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_location: Option<GeoPoint>,
}

impl UpdateRunnerRequest {
    pub fn status(status: RunnerStatus) -> Self {
        Self {
            status,
            last_known_location: None,
        }
    }
}
