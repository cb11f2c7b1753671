//! Traits describing the external collaborators and their shared error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Coordinate, Facility, PickupRequest, StoredRequestId};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to a collaborator.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The user or platform refused access to the device location.
    #[error("Location permission denied")]
    PermissionDenied,
    /// The collaborator did not answer in time.
    #[error("Timed out")]
    Timeout,
    /// The backend answered with a non-success status.
    #[error("Rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Body or reason returned by the backend.
        message: String,
    },
    /// The response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Internal collaborator error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Query parameters for listing candidate facilities.
pub struct FacilityCriteria {
    /// Position to search around, if known.
    pub reference: Option<Coordinate>,
    /// Maximum number of facilities to return.
    pub limit: usize,
}

impl FacilityCriteria {
    /// Construct new criteria.
    #[must_use]
    pub fn new(reference: Option<Coordinate>, limit: usize) -> Self {
        Self { reference, limit }
    }
}

#[async_trait]
/// Source of the device's current position.
pub trait LocationPort: Send + Sync {
    /// Acquire the current coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::PermissionDenied`] or [`PortError::Timeout`] when
    /// no position can be obtained.
    async fn current_coordinate(&self) -> Result<Coordinate, PortError>;
}

#[async_trait]
/// Turns a coordinate into a human-readable address.
pub trait GeocodePort: Send + Sync {
    /// Reverse geocode a coordinate.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the lookup fails.
    async fn reverse_geocode(&self, at: &Coordinate) -> Result<String, PortError>;
}

#[async_trait]
/// Directory of collection facilities.
pub trait FacilityPort: Send + Sync {
    /// List candidate facilities.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the directory cannot be reached.
    async fn list_facilities(&self, criteria: &FacilityCriteria) -> Result<Vec<Facility>, PortError>;
}

#[async_trait]
/// Persistence for finished requests.
pub trait RequestStore: Send + Sync {
    /// Store a request and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request could not be stored.
    async fn persist(&self, request: &PickupRequest) -> Result<StoredRequestId, PortError>;
}
