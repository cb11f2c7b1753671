//! High-level async facade over the external collaborators.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::collaborators::Collaborators;
use crate::config::PilahConfig;
use crate::error::SchedulingError;
use crate::feed::{FacilityResponse, FacilityTicket};
use crate::model::{Coordinate, PickupRequest, StoredRequestId};
use crate::ports::{FacilityCriteria, LocationPort, PortError};

/// Public entry point for location, facility, geocoding, and persistence calls.
pub struct SchedulingService {
    collaborators: Arc<Collaborators>,
    geolocation_timeout: Duration,
    facility_limit: usize,
}

impl SchedulingService {
    /// Create a new service bound to the provided collaborators.
    #[must_use]
    pub fn new(collaborators: Arc<Collaborators>, config: &PilahConfig) -> Self {
        Self {
            collaborators,
            geolocation_timeout: config.geolocation_timeout,
            facility_limit: config.facility_limit,
        }
    }

    /// Acquire the device location within the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::LocationUnavailable`] on denial, provider
    /// failure, or timeout.
    pub async fn locate(&self) -> Result<Coordinate, SchedulingError> {
        acquire(Arc::clone(&self.collaborators.location), self.geolocation_timeout).await
    }

    /// Start acquiring the device location in the background.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn watch_location(&self) -> LocationWatch {
        let location = Arc::clone(&self.collaborators.location);
        let limit = self.geolocation_timeout;
        LocationWatch {
            handle: Some(tokio::spawn(acquire(location, limit))),
        }
    }

    /// Query the facility directory for a ticket, keeping the ticket attached.
    pub async fn fetch_facilities(&self, ticket: FacilityTicket) -> FacilityResponse {
        let criteria = FacilityCriteria::new(ticket.reference, self.facility_limit);
        let result = self.collaborators.facilities.list_facilities(&criteria).await;
        match &result {
            Ok(facilities) => tracing::debug!(token = ticket.token, count = facilities.len(), "facility list received"),
            Err(err) => tracing::warn!(token = ticket.token, error = %err, "facility list unavailable"),
        }
        FacilityResponse { ticket, result }
    }

    /// Suggest a pickup address for a coordinate. Failures yield an empty
    /// string.
    pub async fn suggest_address(&self, at: Coordinate) -> String {
        match self.collaborators.geocoder.reverse_geocode(&at).await {
            Ok(address) => address,
            Err(err) => {
                tracing::warn!(coordinate = %at, error = %err, "reverse geocoding failed");
                String::new()
            }
        }
    }

    /// Hand a finished request to the request store.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Persistence`] when storing fails.
    pub async fn persist(&self, request: &PickupRequest) -> Result<StoredRequestId, SchedulingError> {
        let stored = self
            .collaborators
            .store
            .persist(request)
            .await
            .map_err(SchedulingError::Persistence)?;
        tracing::info!(
            id = %stored,
            facility = %request.facility_id,
            branch = %request.branch,
            items = request.line_items.len(),
            "pickup request stored"
        );
        Ok(stored)
    }
}

/// Pending background location acquisition. Dropping it aborts the task.
#[derive(Debug)]
pub struct LocationWatch {
    handle: Option<JoinHandle<Result<Coordinate, SchedulingError>>>,
}

impl LocationWatch {
    /// Whether the acquisition has completed and [`LocationWatch::wait`] will
    /// not block.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the acquisition result.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::LocationUnavailable`] when no position was
    /// obtained or the watch was cancelled.
    pub async fn wait(mut self) -> Result<Coordinate, SchedulingError> {
        let Some(handle) = self.handle.take() else {
            return Err(SchedulingError::LocationUnavailable(PortError::Internal(
                "location watch already released".to_owned(),
            )));
        };
        match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(SchedulingError::LocationUnavailable(PortError::Internal(
                join_err.to_string(),
            ))),
        }
    }

    /// Release the pending acquisition.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                tracing::debug!("releasing pending location watch");
            }
            handle.abort();
        }
    }
}

impl Drop for LocationWatch {
    fn drop(&mut self) {
        self.release();
    }
}

async fn acquire(location: Arc<dyn LocationPort>, limit: Duration) -> Result<Coordinate, SchedulingError> {
    let outcome = match timeout(limit, location.current_coordinate()).await {
        Ok(Ok(coordinate)) if coordinate.is_valid() => Ok(coordinate),
        Ok(Ok(coordinate)) => Err(PortError::Internal(format!(
            "device reported invalid coordinate {coordinate}"
        ))),
        Ok(Err(err)) => Err(err),
        Err(_elapsed) => Err(PortError::Timeout),
    };
    outcome.map_err(|err| {
        tracing::warn!(error = %err, "device location unavailable, facilities stay unranked");
        SchedulingError::LocationUnavailable(err)
    })
}
