//! Materializes the immutable [`PickupRequest`] from a finished wizard.

use chrono::{DateTime, Utc};

use crate::error::{Field, ValidationFailure};
use crate::model::{DeliveryBranch, PickupRequest};
use crate::wizard::WizardState;

/// Build the request for a validated terminal state.
///
/// Line items follow the order in which categories entered the basket. The
/// pickup address is only carried for [`DeliveryBranch::FacilityPickup`].
///
/// # Errors
///
/// Returns a [`ValidationFailure`] naming the first required field that is
/// still missing.
pub fn assemble(
    state: &WizardState,
    facility_name: &str,
    created_at: DateTime<Utc>,
) -> Result<PickupRequest, ValidationFailure> {
    let terminal = state.step_kind();
    let missing = |field: Field| ValidationFailure::new(terminal, field, format!("The {field} is missing"));

    let branch = state.branch.ok_or_else(|| missing(Field::Branch))?;
    let facility_id = state
        .facility_id
        .clone()
        .ok_or_else(|| missing(Field::Facility))?;
    let scheduled_date = state
        .scheduled_date
        .ok_or_else(|| missing(Field::ScheduledDate))?;
    let scheduled_time_slot = state
        .scheduled_time_slot
        .clone()
        .ok_or_else(|| missing(Field::TimeSlot))?;

    let pickup_address = match branch {
        DeliveryBranch::FacilityPickup => Some(state.pickup_address.trim().to_owned()),
        DeliveryBranch::SelfDelivery => None,
    };

    Ok(PickupRequest {
        facility_id,
        facility_name: facility_name.to_owned(),
        scheduled_date,
        scheduled_time_slot,
        line_items: state.basket.line_items(),
        branch,
        pickup_address,
        contact_phone: state.contact_phone.trim().to_owned(),
        notes: state.notes.trim().to_owned(),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::model::{CategoryId, FacilityId, TimeSlotId};

    fn complete_state(branch: DeliveryBranch) -> WizardState {
        let mut state = WizardState {
            branch: Some(branch),
            current_step: crate::steps::step_count(branch),
            facility_id: Some(FacilityId("bs-melati".to_owned())),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 3, 12),
            scheduled_time_slot: Some(TimeSlotId("slot-1000".to_owned())),
            pickup_address: "  Jl. Melati No. 4  ".to_owned(),
            contact_phone: "0812-3456-7890".to_owned(),
            notes: " ring twice ".to_owned(),
            ..WizardState::default()
        };
        state.basket.set_quantity(&CategoryId::new("paper-koran"), 2);
        state
    }

    #[test]
    fn self_delivery_omits_pickup_address() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
        let request = assemble(
            &complete_state(DeliveryBranch::SelfDelivery),
            "Bank Sampah Melati",
            created_at,
        )
        .unwrap();

        assert_eq!(request.pickup_address, None);
        assert_eq!(request.line_items.len(), 1);
        assert_eq!(request.created_at, created_at);

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("pickup_address").is_none(), "field must be absent: {json}");
    }

    #[test]
    fn facility_pickup_carries_trimmed_address() {
        let request = assemble(
            &complete_state(DeliveryBranch::FacilityPickup),
            "Bank Sampah Melati",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(request.pickup_address.as_deref(), Some("Jl. Melati No. 4"));
        assert_eq!(request.notes, "ring twice");
        assert_eq!(request.facility_name, "Bank Sampah Melati");
    }

    #[test]
    fn missing_slot_is_reported() {
        let mut state = complete_state(DeliveryBranch::SelfDelivery);
        state.scheduled_time_slot = None;

        let failure = assemble(&state, "x", Utc::now()).unwrap_err();
        assert_eq!(failure.field, Field::TimeSlot);
    }
}
