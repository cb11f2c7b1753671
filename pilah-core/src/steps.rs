//! Step topology: which steps a branch walks through, in which order.
//!
//! Gates are dispatched on [`StepKind`] so the same check applies wherever a
//! branch places the step.

use serde::{Deserialize, Serialize};

use crate::model::DeliveryBranch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Purpose of a wizard step.
pub enum StepKind {
    /// Pick pickup or self-delivery.
    DeliveryChoice,
    /// Pick a facility from the ranked list.
    FacilityChoice,
    /// Pick a date and time slot.
    Schedule,
    /// Fill the waste basket.
    WasteSelection,
    /// Enter the pickup address and phone number.
    PickupLocation,
    /// Confirm everything before submitting.
    Review,
    /// Fill the basket and confirm on one screen.
    WasteSelectionReview,
}

impl StepKind {
    /// Heading shown for the step.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            StepKind::DeliveryChoice => "Delivery method",
            StepKind::FacilityChoice => "Facility",
            StepKind::Schedule => "Date and time",
            StepKind::WasteSelection => "Waste",
            StepKind::PickupLocation => "Pickup location",
            StepKind::Review => "Review",
            StepKind::WasteSelectionReview => "Waste and review",
        }
    }

    /// Whether submission happens on this step.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, StepKind::Review | StepKind::WasteSelectionReview)
    }
}

const PICKUP_STEPS: [StepKind; 6] = [
    StepKind::DeliveryChoice,
    StepKind::FacilityChoice,
    StepKind::Schedule,
    StepKind::WasteSelection,
    StepKind::PickupLocation,
    StepKind::Review,
];

const SELF_DELIVERY_STEPS: [StepKind; 4] = [
    StepKind::DeliveryChoice,
    StepKind::FacilityChoice,
    StepKind::Schedule,
    StepKind::WasteSelectionReview,
];

/// Steps of a branch in order.
#[must_use]
pub fn steps(branch: DeliveryBranch) -> &'static [StepKind] {
    match branch {
        DeliveryBranch::FacilityPickup => &PICKUP_STEPS,
        DeliveryBranch::SelfDelivery => &SELF_DELIVERY_STEPS,
    }
}

/// Number of steps a branch walks through.
#[must_use]
pub fn step_count(branch: DeliveryBranch) -> usize {
    steps(branch).len()
}

/// Kind of the 1-based step `index`. Before a branch is chosen only the
/// first step exists.
#[must_use]
pub fn step_kind(branch: Option<DeliveryBranch>, index: usize) -> Option<StepKind> {
    match branch {
        Some(branch) => index.checked_sub(1).and_then(|slot| steps(branch).get(slot).copied()),
        None => (index == 1).then_some(StepKind::DeliveryChoice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_counts_per_branch() {
        assert_eq!(step_count(DeliveryBranch::FacilityPickup), 6);
        assert_eq!(step_count(DeliveryBranch::SelfDelivery), 4);
    }

    #[test]
    fn each_branch_ends_on_exactly_one_terminal_step() {
        for branch in DeliveryBranch::ALL {
            let path = steps(branch);
            let terminals = path.iter().filter(|kind| kind.is_terminal()).count();
            assert_eq!(terminals, 1, "{branch}");
            assert!(path.last().is_some_and(|kind| kind.is_terminal()), "{branch} ends on terminal");
            assert_eq!(path.first(), Some(&StepKind::DeliveryChoice));
        }
    }

    #[test]
    fn out_of_range_indexes_have_no_kind() {
        assert_eq!(step_kind(Some(DeliveryBranch::SelfDelivery), 0), None);
        assert_eq!(step_kind(Some(DeliveryBranch::SelfDelivery), 5), None);
        assert_eq!(step_kind(None, 2), None);
        assert_eq!(step_kind(None, 1), Some(StepKind::DeliveryChoice));
        assert_eq!(
            step_kind(Some(DeliveryBranch::FacilityPickup), 5),
            Some(StepKind::PickupLocation)
        );
    }
}
