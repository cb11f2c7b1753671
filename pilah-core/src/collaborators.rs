//! Bundle of the external collaborators a scheduling service needs.

use std::sync::Arc;

use crate::ports::{FacilityPort, GeocodePort, LocationPort, RequestStore};

/// One implementation per port, shared between the service and spawned tasks.
pub struct Collaborators {
    /// Device location source.
    pub location: Arc<dyn LocationPort>,
    /// Reverse geocoder for address suggestions.
    pub geocoder: Arc<dyn GeocodePort>,
    /// Facility directory.
    pub facilities: Arc<dyn FacilityPort>,
    /// Persistence for finished requests.
    pub store: Arc<dyn RequestStore>,
}
