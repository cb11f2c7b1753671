use std::fmt;

use chrono::Duration;
use pilah_core::{
    model::{CategoryId, DeliveryBranch, FacilityId, TimeSlotId},
    session::{SchedulingSession, SubmissionReceipt},
    steps::StepKind,
    wizard::{WizardController, WizardState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Step(StepKind),
    Done,
}

/// Where typed keys go on the steps that mix a list with text inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    List,
    Address,
    Phone,
    Notes,
}

impl Focus {
    /// Next stop of the Tab cycle on `step`.
    pub(crate) fn next_on(self, step: StepKind) -> Self {
        match (step, self) {
            (StepKind::PickupLocation, Focus::Address) => Focus::Phone,
            (StepKind::PickupLocation, Focus::Phone) => Focus::Notes,
            (StepKind::PickupLocation, _) => Focus::Address,
            (_, Focus::List) => Focus::Phone,
            (_, Focus::Phone) => Focus::Notes,
            (_, _) => Focus::List,
        }
    }

    /// Where the focus starts when `step` is entered.
    pub(crate) fn initial_on(step: StepKind) -> Self {
        if step == StepKind::PickupLocation {
            Focus::Address
        } else {
            Focus::List
        }
    }
}

pub(crate) struct App {
    pub session: SchedulingSession,

    pub branch_index: usize,
    pub facility_index: usize,
    pub slot_index: usize,
    pub category_index: usize,
    pub focus: Focus,

    pub receipt: Option<SubmissionReceipt>,

    pub is_loading: bool,
    pub is_locating: bool,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(session: SchedulingSession) -> Self {
        Self {
            session,
            branch_index: 0,
            facility_index: 0,
            slot_index: 0,
            category_index: 0,
            focus: Focus::List,
            receipt: None,
            is_loading: false,
            is_locating: false,
            error_message: None,
        }
    }

    pub(crate) fn screen(&self) -> Screen {
        match self.session.state() {
            Ok(state) => Screen::Step(state.step_kind()),
            Err(_) => Screen::Done,
        }
    }

    pub(crate) fn state(&self) -> Option<&WizardState> {
        self.session.state().ok()
    }

    pub(crate) fn report<T, E: fmt::Display>(&mut self, outcome: Result<T, E>) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.error_message = None;
                Some(value)
            }
            Err(err) => {
                self.error_message = Some(err.to_string());
                None
            }
        }
    }

    pub(crate) fn choose_current_branch(&mut self) {
        let branch = DeliveryBranch::ALL
            .get(self.branch_index)
            .copied()
            .unwrap_or(DeliveryBranch::FacilityPickup);
        let chosen = self.session.choose_branch(branch);
        if self.report(chosen).is_some() {
            self.advance();
        }
    }

    pub(crate) fn choose_current_facility(&mut self) {
        let id = self.session.wizard().ok().and_then(|wizard| {
            wizard
                .facilities()
                .get(self.facility_index)
                .map(|ranked| ranked.facility.id.clone())
        });
        if let Some(id) = id {
            self.with_wizard(|wizard| wizard.set_facility(Some(id)));
            self.advance();
        } else {
            self.error_message = Some("No facility to choose yet (press r to reload)".into());
        }
    }

    pub(crate) fn shift_date(&mut self, days: i64) {
        let Ok(wizard) = self.session.wizard_mut() else {
            return;
        };
        let today = wizard.now().date_naive();
        // the first press picks today, later presses move day by day
        let shifted = wizard
            .state()
            .scheduled_date
            .map_or(today, |current| current + Duration::days(days));
        wizard.set_scheduled_date(Some(shifted.max(today)));
    }

    pub(crate) fn select_slot(&mut self, offset: isize) {
        let Ok(wizard) = self.session.wizard_mut() else {
            return;
        };
        let count = wizard.slots().slots().len();
        if count == 0 {
            return;
        }
        if wizard.state().scheduled_time_slot.is_some() {
            self.slot_index = self
                .slot_index
                .saturating_add_signed(offset)
                .min(count - 1);
        }
        let slot: Option<TimeSlotId> = wizard
            .slots()
            .slots()
            .get(self.slot_index)
            .map(|slot| slot.id.clone());
        wizard.set_time_slot(slot);
    }

    pub(crate) fn current_category(&self) -> Option<CategoryId> {
        self.session.wizard().ok().and_then(|wizard| {
            wizard
                .catalog()
                .categories()
                .get(self.category_index)
                .map(|category| category.id.clone())
        })
    }

    pub(crate) fn step_quantity(&mut self, delta: i32) {
        if let Some(category) = self.current_category() {
            let outcome = self.session.set_quantity(&category, delta);
            self.report(outcome);
        }
    }

    pub(crate) fn toggle_current_category(&mut self) {
        if let Some(category) = self.current_category() {
            let selected = self
                .state()
                .is_some_and(|state| state.basket.contains(&category));
            let outcome = self.session.toggle_category(&category, !selected);
            self.report(outcome);
        }
    }

    /// Whether keys currently go into a text input.
    pub(crate) fn is_editing_text(&self) -> bool {
        self.focus != Focus::List
    }

    pub(crate) fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let focus = self.focus;
        let Some(state) = self.state() else {
            return;
        };
        let mut text = match focus {
            Focus::List => return,
            Focus::Address => state.pickup_address.clone(),
            Focus::Phone => state.contact_phone.clone(),
            Focus::Notes => state.notes.clone(),
        };
        edit(&mut text);
        self.with_wizard(|wizard| match focus {
            Focus::List => {}
            Focus::Address => wizard.set_pickup_address(text),
            Focus::Phone => wizard.set_contact_phone(text),
            Focus::Notes => wizard.set_notes(text),
        });
    }

    pub(crate) fn advance(&mut self) {
        let outcome = self.session.advance();
        if self.report(outcome).is_some() {
            self.reset_focus();
        }
    }

    pub(crate) fn retreat(&mut self) {
        let outcome = self.session.retreat();
        if self.report(outcome).is_some() {
            self.reset_focus();
        }
    }

    pub(crate) fn facility_name(&self, id: &FacilityId) -> Option<String> {
        let wizard = self.session.wizard().ok()?;
        wizard.facility(id).map(|ranked| ranked.facility.name.clone())
    }

    fn reset_focus(&mut self) {
        if let Screen::Step(step) = self.screen() {
            self.focus = Focus::initial_on(step);
        }
    }

    fn with_wizard(&mut self, edit: impl FnOnce(&mut WizardController)) {
        if let Ok(wizard) = self.session.wizard_mut() {
            edit(wizard);
        }
    }
}
