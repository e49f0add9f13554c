use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidStatus(String),
    InvalidCoordinates { longitude: String, latitude: String },
    EmptyIdentity,
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidStatus(raw) => {
                write!(f, "invalid runner status: {raw}")
            }
            ModelError::InvalidCoordinates {
                longitude,
                latitude,
            } => write!(
                f,
                "coordinates out of range: lon={longitude} lat={latitude}"
            ),
            ModelError::EmptyIdentity => {
                write!(f, "runner identity must not be empty")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
