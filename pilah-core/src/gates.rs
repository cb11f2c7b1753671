//! Validation gates run before a step transition.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::basket::MAX_QUANTITY;
use crate::catalog::{TimeSlotCatalog, WasteCatalog};
use crate::error::{Field, ValidationFailure};
use crate::model::{DeliveryBranch, RankedFacility};
use crate::steps::{StepKind, steps};
use crate::wizard::WizardState;

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{4}-\d{4}$").expect("phone pattern is a valid regex")
});

/// Whether `phone` follows the national `dddd-dddd-dddd` format.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone.trim())
}

pub(crate) struct GateContext<'wizard> {
    pub(crate) state: &'wizard WizardState,
    pub(crate) facilities: &'wizard [RankedFacility],
    pub(crate) catalog: &'wizard WasteCatalog,
    pub(crate) slots: &'wizard TimeSlotCatalog,
    pub(crate) now: NaiveDateTime,
}

/// Run the gate of `kind`. Terminal steps re-run every gate on the branch's
/// path so a field cleared after navigating back is still caught.
pub(crate) fn check(kind: StepKind, context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    if !kind.is_terminal() {
        return check_own(kind, context);
    }
    let Some(branch) = context.state.branch else {
        return check_own(StepKind::DeliveryChoice, context);
    };
    steps(branch)
        .iter()
        .try_for_each(|step| check_own(*step, context))
}

fn check_own(kind: StepKind, context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    match kind {
        StepKind::DeliveryChoice => check_branch(context),
        StepKind::FacilityChoice => check_facility(context),
        StepKind::Schedule => check_schedule(context),
        StepKind::WasteSelection => check_basket(kind, context),
        StepKind::PickupLocation => check_pickup_location(context),
        StepKind::Review => Ok(()),
        StepKind::WasteSelectionReview => {
            check_basket(kind, context)?;
            check_optional_phone(kind, context)
        }
    }
}

fn check_branch(context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    if context.state.branch.is_some() {
        return Ok(());
    }
    Err(ValidationFailure::new(
        StepKind::DeliveryChoice,
        Field::Branch,
        "Choose whether the facility picks up your waste or you deliver it yourself",
    ))
}

fn check_facility(context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    let fail = |message: &str| {
        Err(ValidationFailure::new(
            StepKind::FacilityChoice,
            Field::Facility,
            message,
        ))
    };

    if context.facilities.is_empty() {
        return fail("No facilities are available yet; retry loading the list");
    }
    let Some(chosen) = &context.state.facility_id else {
        return match context.state.branch {
            Some(DeliveryBranch::SelfDelivery) => fail("Choose the facility you will deliver to"),
            _ => fail("Choose the facility that should collect your waste"),
        };
    };
    if context
        .facilities
        .iter()
        .any(|ranked| &ranked.facility.id == chosen)
    {
        Ok(())
    } else {
        fail("The chosen facility is no longer available; choose another one")
    }
}

fn check_schedule(context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    let noun = match context.state.branch {
        Some(DeliveryBranch::SelfDelivery) => "drop-off",
        _ => "pickup",
    };
    let today = context.now.date();

    let Some(date) = context.state.scheduled_date else {
        return Err(ValidationFailure::new(
            StepKind::Schedule,
            Field::ScheduledDate,
            format!("Choose a {noun} date"),
        ));
    };
    if date < today {
        return Err(ValidationFailure::new(
            StepKind::Schedule,
            Field::ScheduledDate,
            format!("The {noun} date cannot be in the past"),
        ));
    }

    let Some(slot) = &context.state.scheduled_time_slot else {
        return Err(ValidationFailure::new(
            StepKind::Schedule,
            Field::TimeSlot,
            format!("Choose a {noun} time"),
        ));
    };
    if context.slots.slot(slot).is_none() {
        return Err(ValidationFailure::new(
            StepKind::Schedule,
            Field::TimeSlot,
            "Choose one of the offered time slots",
        ));
    }
    if !context.slots.is_available(slot, date, context.now) {
        return Err(ValidationFailure::new(
            StepKind::Schedule,
            Field::TimeSlot,
            format!("That {noun} time is no longer available; choose another one"),
        ));
    }
    Ok(())
}

fn check_basket(kind: StepKind, context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    let basket = &context.state.basket;
    if basket.is_empty() {
        return Err(ValidationFailure::new(
            kind,
            Field::Basket,
            "Select at least one kind of waste",
        ));
    }
    for (category, quantity) in basket.iter() {
        if !context.catalog.contains(category) {
            return Err(ValidationFailure::new(
                kind,
                Field::Basket,
                format!("Unknown waste category {category}"),
            ));
        }
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(ValidationFailure::new(
                kind,
                Field::Basket,
                format!("Quantity for {category} must be between 1 and {MAX_QUANTITY}"),
            ));
        }
    }
    Ok(())
}

fn check_pickup_location(context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    if context.state.pickup_address.trim().is_empty() {
        return Err(ValidationFailure::new(
            StepKind::PickupLocation,
            Field::PickupAddress,
            "Enter the address we should collect from",
        ));
    }
    if !is_valid_phone(&context.state.contact_phone) {
        return Err(ValidationFailure::new(
            StepKind::PickupLocation,
            Field::ContactPhone,
            "Enter a phone number like 0812-3456-7890",
        ));
    }
    Ok(())
}

fn check_optional_phone(kind: StepKind, context: &GateContext<'_>) -> Result<(), ValidationFailure> {
    let phone = context.state.contact_phone.trim();
    if phone.is_empty() || is_valid_phone(phone) {
        Ok(())
    } else {
        Err(ValidationFailure::new(
            kind,
            Field::ContactPhone,
            "Enter a phone number like 0812-3456-7890, or leave it empty",
        ))
    }
}
