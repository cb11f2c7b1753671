//! The scheduling wizard: a stepper whose path depends on the delivery branch.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::assemble::assemble;
use crate::basket::LineItemBasket;
use crate::catalog::{TimeSlotCatalog, WasteCatalog};
use crate::error::{SchedulingError, ValidationFailure};
use crate::gates::{self, GateContext};
use crate::model::{CategoryId, DeliveryBranch, FacilityId, PickupRequest, RankedFacility, TimeSlotId};
use crate::steps::{StepKind, step_count, step_kind};

/// Source of the current local time.
pub type Clock = fn() -> DateTime<Local>;

fn system_clock() -> DateTime<Local> {
    Local::now()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Everything entered during one scheduling session.
pub struct WizardState {
    /// Chosen branch, fixed once the wizard leaves the first step.
    pub branch: Option<DeliveryBranch>,
    /// 1-based step index within the branch's path.
    pub current_step: usize,
    /// Chosen facility.
    pub facility_id: Option<FacilityId>,
    /// Day of the pickup or drop-off.
    pub scheduled_date: Option<NaiveDate>,
    /// Time slot on that day.
    pub scheduled_time_slot: Option<TimeSlotId>,
    /// Selected waste.
    pub basket: LineItemBasket,
    /// Pickup address, only required for facility pickup.
    pub pickup_address: String,
    /// Contact phone.
    pub contact_phone: String,
    /// Free-text notes.
    pub notes: String,
    /// Message from the last failed gate, cleared on every step change.
    pub validation_error: Option<ValidationFailure>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            branch: None,
            current_step: 1,
            facility_id: None,
            scheduled_date: None,
            scheduled_time_slot: None,
            basket: LineItemBasket::new(),
            pickup_address: String::new(),
            contact_phone: String::new(),
            notes: String::new(),
            validation_error: None,
        }
    }
}

impl WizardState {
    /// Number of steps for the chosen branch; 1 until a branch is chosen.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.branch.map_or(1, step_count)
    }

    /// Kind of the current step.
    #[must_use]
    pub fn step_kind(&self) -> StepKind {
        step_kind(self.branch, self.current_step).unwrap_or(StepKind::DeliveryChoice)
    }

    /// Whether the current step is where submission happens.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.branch.is_some() && self.current_step == self.step_count()
    }
}

/// Drives the step sequence and owns the session's [`WizardState`].
#[derive(Debug, Clone)]
pub struct WizardController {
    state: WizardState,
    facilities: Vec<RankedFacility>,
    catalog: WasteCatalog,
    slots: TimeSlotCatalog,
    clock: Clock,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new(WasteCatalog::standard(), TimeSlotCatalog::standard())
    }
}

impl WizardController {
    /// Start a fresh wizard on step 1.
    #[must_use]
    pub fn new(catalog: WasteCatalog, slots: TimeSlotCatalog) -> Self {
        Self {
            state: WizardState::default(),
            facilities: Vec::new(),
            catalog,
            slots,
            clock: system_clock,
        }
    }

    /// Replace the time source, mostly for tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Read-only view for rendering.
    #[must_use]
    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Latest ranked facility list.
    #[must_use]
    pub fn facilities(&self) -> &[RankedFacility] {
        &self.facilities
    }

    /// Waste taxonomy used for selection.
    #[must_use]
    pub fn catalog(&self) -> &WasteCatalog {
        &self.catalog
    }

    /// Time slots offered for scheduling.
    #[must_use]
    pub fn slots(&self) -> &TimeSlotCatalog {
        &self.slots
    }

    /// Current local time according to the wizard's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Local> {
        (self.clock)()
    }

    /// Choose pickup or self-delivery.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::BranchLocked`] unless on step 1.
    pub fn choose_branch(&mut self, branch: DeliveryBranch) -> Result<(), SchedulingError> {
        if self.state.current_step != 1 {
            return Err(SchedulingError::BranchLocked);
        }
        tracing::debug!(%branch, "branch chosen");
        self.state.branch = Some(branch);
        if self
            .state
            .validation_error
            .as_ref()
            .is_some_and(|failure| failure.step == StepKind::DeliveryChoice)
        {
            self.state.validation_error = None;
        }
        Ok(())
    }

    /// Run the current step's gate and move forward on success.
    ///
    /// Returns the new step index. On the terminal step the index stays put;
    /// use [`WizardController::submit`] there.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationFailure`] of the gate, which is also stored as
    /// the state's `validation_error`.
    pub fn advance(&mut self) -> Result<usize, ValidationFailure> {
        self.run_gate()?;
        let last = self.state.step_count();
        let next = (self.state.current_step + 1).min(last);
        if next != self.state.current_step {
            tracing::debug!(from = self.state.current_step, to = next, "wizard advanced");
        }
        self.state.current_step = next;
        self.state.validation_error = None;
        Ok(next)
    }

    /// Step back one step, never below the first. Entered values are kept.
    pub fn retreat(&mut self) -> usize {
        let previous = self.state.current_step.saturating_sub(1).max(1);
        if previous != self.state.current_step {
            tracing::debug!(from = self.state.current_step, to = previous, "wizard retreated");
        }
        self.state.current_step = previous;
        self.state.validation_error = None;
        previous
    }

    /// Validate the terminal step and assemble the request.
    ///
    /// The wizard state is left untouched so a failed persist can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::NotAtTerminalStep`] before the final step,
    /// or [`SchedulingError::Validation`] when a gate on the path fails.
    pub fn submit(&mut self) -> Result<PickupRequest, SchedulingError> {
        if !self.state.is_terminal() {
            return Err(SchedulingError::NotAtTerminalStep);
        }
        self.run_gate()?;

        let facility_name = self
            .state
            .facility_id
            .as_ref()
            .and_then(|id| self.facility(id))
            .map(|ranked| ranked.facility.name.clone())
            .unwrap_or_default();
        let request = assemble(&self.state, &facility_name, self.now().to_utc())
            .inspect_err(|failure| self.state.validation_error = Some(failure.clone()))?;
        self.state.validation_error = None;
        Ok(request)
    }

    /// Install the latest ranked facilities.
    pub fn set_facilities(&mut self, facilities: Vec<RankedFacility>) {
        self.facilities = facilities;
    }

    /// Look up a facility in the ranked list.
    #[must_use]
    pub fn facility(&self, id: &FacilityId) -> Option<&RankedFacility> {
        self.facilities
            .iter()
            .find(|ranked| &ranked.facility.id == id)
    }

    /// Choose a facility.
    pub fn set_facility(&mut self, id: Option<FacilityId>) {
        self.state.facility_id = id;
    }

    /// Choose the scheduled day.
    pub fn set_scheduled_date(&mut self, date: Option<NaiveDate>) {
        self.state.scheduled_date = date;
    }

    /// Choose the scheduled time slot.
    pub fn set_time_slot(&mut self, slot: Option<TimeSlotId>) {
        self.state.scheduled_time_slot = slot;
    }

    /// Set the pickup address.
    pub fn set_pickup_address<S: Into<String>>(&mut self, address: S) {
        self.state.pickup_address = address.into();
    }

    /// Set the contact phone.
    pub fn set_contact_phone<S: Into<String>>(&mut self, phone: S) {
        self.state.contact_phone = phone.into();
    }

    /// Set the notes.
    pub fn set_notes<S: Into<String>>(&mut self, notes: S) {
        self.state.notes = notes.into();
    }

    /// Stepper control: change a category's quantity by `delta`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::UnknownCategory`] for ids outside the catalog.
    pub fn set_quantity(&mut self, category: &CategoryId, delta: i32) -> Result<u8, SchedulingError> {
        self.known_category(category)?;
        Ok(self.state.basket.set_quantity(category, delta))
    }

    /// Checkbox control: select or deselect a category.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::UnknownCategory`] for ids outside the catalog.
    pub fn toggle_category(&mut self, category: &CategoryId, selected: bool) -> Result<(), SchedulingError> {
        self.known_category(category)?;
        self.state.basket.toggle(category, selected);
        Ok(())
    }

    fn known_category(&self, category: &CategoryId) -> Result<(), SchedulingError> {
        if self.catalog.contains(category) {
            Ok(())
        } else {
            Err(SchedulingError::UnknownCategory(category.clone()))
        }
    }

    fn run_gate(&mut self) -> Result<(), ValidationFailure> {
        let context = GateContext {
            state: &self.state,
            facilities: &self.facilities,
            catalog: &self.catalog,
            slots: &self.slots,
            now: self.now().naive_local(),
        };
        let outcome = gates::check(self.state.step_kind(), &context);
        if let Err(failure) = &outcome {
            tracing::debug!(step = ?failure.step, field = %failure.field, "gate rejected step");
            self.state.validation_error = Some(failure.clone());
        }
        outcome
    }
}
