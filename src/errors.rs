use thiserror::Error;

use crate::geo::GeolocationError;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents a failure to reach the database at all.
    #[error("Clinic repository unavailable")]
    RepositoryUnavailable { source: sqlx::Error },

    /// Represents an error with the request.
    #[error("Bad request")]
    BadRequest,

    /// Represents a clinic ID that does not exist.
    #[error("No clinic with ID {0}")]
    UnknownClinic(i32),

    /// Represents a vaccine name outside the catalog.
    #[error("Unknown vaccine {0:?}")]
    UnknownVaccine(String),

    /// Represents a nearby lookup made before any coordinates arrived.
    #[error("No coordinates received yet")]
    LocationPending,

    /// Represents a geolocation request that ended in failure.
    #[error("Could not determine location: {0}")]
    LocationFailed(GeolocationError),

    /// Represents an unrecognized geolocation failure reason.
    #[error("Unrecognized geolocation error {0:?}")]
    InvalidLocationError(String),
}

impl BackendError {
    /// Whether the error means the repository could not be reached,
    /// as opposed to a problem with a particular request.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::RepositoryUnavailable { .. })
    }
}
