//! Failure kinds surfaced to the user. None of them is fatal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::CategoryId;
use crate::ports::PortError;
use crate::steps::StepKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Wizard field a validation failure points at.
pub enum Field {
    /// Delivery branch.
    Branch,
    /// Chosen facility.
    Facility,
    /// Scheduled date.
    ScheduledDate,
    /// Scheduled time slot.
    TimeSlot,
    /// Waste basket.
    Basket,
    /// Pickup address.
    PickupAddress,
    /// Contact phone.
    ContactPhone,
}

impl fmt::Display for Field {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Branch => "delivery method",
            Field::Facility => "facility",
            Field::ScheduledDate => "date",
            Field::TimeSlot => "time slot",
            Field::Basket => "waste selection",
            Field::PickupAddress => "pickup address",
            Field::ContactPhone => "phone number",
        };
        formatter.write_str(name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
/// A step gate rejected the current state.
pub struct ValidationFailure {
    /// Step whose gate failed.
    pub step: StepKind,
    /// Field at fault.
    pub field: Field,
    /// Short user-facing message.
    pub message: String,
}

impl ValidationFailure {
    pub(crate) fn new<M: Into<String>>(step: StepKind, field: Field, message: M) -> Self {
        Self {
            step,
            field,
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
/// Everything that can go wrong during a scheduling session.
pub enum SchedulingError {
    /// A gate rejected the current step.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// No device location; facilities stay unranked.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(#[source] PortError),
    /// The facility directory could not be reached.
    #[error("Facility list unavailable: {0}")]
    FacilityListUnavailable(#[source] PortError),
    /// Storing the finished request failed; the session is kept for retry.
    #[error("Could not save the request: {0}")]
    Persistence(#[source] PortError),
    /// The branch can only change on the first step.
    #[error("The delivery method can only be changed on the first step")]
    BranchLocked,
    /// Submission attempted before the final step.
    #[error("Submission is only possible on the final step")]
    NotAtTerminalStep,
    /// Category id not in the catalog.
    #[error("Unknown waste category: {0}")]
    UnknownCategory(CategoryId),
    /// The session was already submitted or abandoned.
    #[error("The scheduling session is closed")]
    SessionClosed,
}

impl SchedulingError {
    /// Whether repeating the same operation later may succeed without the
    /// user changing anything.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SchedulingError::LocationUnavailable(_)
                | SchedulingError::FacilityListUnavailable(_)
                | SchedulingError::Persistence(_)
        )
    }
}
