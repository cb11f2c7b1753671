use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pilah_core::{model::DeliveryBranch, steps::StepKind};

use crate::app::{App, Focus, Screen};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Re-run the facility retrieval for the current reference
    RefreshFacilities,
    /// Fill the pickup address from the reference coordinate
    SuggestAddress,
    /// Persist the request via `session.submit`()
    Submit,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    // Global quit shortcut
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    let Screen::Step(step) = app.screen() else {
        // confirmation screen: any key leaves
        return Action::Quit;
    };

    // 'q' is text while a text input has focus
    if key.code == Char('q') && key.modifiers.is_empty() && !app.is_editing_text() {
        return Action::Quit;
    }

    let mut action = Action::None;

    match step {
        StepKind::DeliveryChoice => match key.code {
            Up | Char('k') => {
                app.branch_index = app.branch_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.branch_index + 1 < DeliveryBranch::ALL.len() {
                    app.branch_index += 1;
                }
            }
            Enter | Char(' ') => app.choose_current_branch(),
            Esc => action = Action::Quit,
            _ => {}
        },

        StepKind::FacilityChoice => match key.code {
            Up | Char('k') => {
                app.facility_index = app.facility_index.saturating_sub(1);
            }
            Down | Char('j') => {
                let count = app
                    .session
                    .wizard()
                    .map_or(0, |wizard| wizard.facilities().len());
                if app.facility_index + 1 < count {
                    app.facility_index += 1;
                }
            }
            Enter | Char(' ') => app.choose_current_facility(),
            Char('r') => action = Action::RefreshFacilities,
            Esc | Backspace => app.retreat(),
            _ => {}
        },

        StepKind::Schedule => match key.code {
            Left | Char('h') => app.shift_date(-1),
            Right | Char('l') => app.shift_date(1),
            Up | Char('k') => app.select_slot(-1),
            Down | Char('j') => app.select_slot(1),
            Enter => app.advance(),
            Esc | Backspace => app.retreat(),
            _ => {}
        },

        StepKind::WasteSelectionReview if app.is_editing_text() => match key.code {
            Tab => app.focus = app.focus.next_on(step),
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.edit_focused(|text| text.push(character));
                }
            }
            Backspace => app.edit_focused(|text| {
                text.pop();
            }),
            Enter => action = Action::Submit,
            Esc => app.focus = Focus::List,
            _ => {}
        },

        StepKind::WasteSelection | StepKind::WasteSelectionReview => match key.code {
            Up | Char('k') => {
                app.category_index = app.category_index.saturating_sub(1);
            }
            Down | Char('j') => {
                let count = app
                    .session
                    .wizard()
                    .map_or(0, |wizard| wizard.catalog().categories().len());
                if app.category_index + 1 < count {
                    app.category_index += 1;
                }
            }
            Right | Char('+') => app.step_quantity(1),
            Left | Char('-') => app.step_quantity(-1),
            Char(' ') => app.toggle_current_category(),
            Tab if step == StepKind::WasteSelectionReview => app.focus = app.focus.next_on(step),
            Enter if step == StepKind::WasteSelectionReview => action = Action::Submit,
            Enter => app.advance(),
            Esc | Backspace => app.retreat(),
            _ => {}
        },

        StepKind::PickupLocation => match key.code {
            Tab | Down => app.focus = app.focus.next_on(step),
            Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                action = Action::SuggestAddress;
            }
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.edit_focused(|text| text.push(character));
                }
            }
            Backspace => app.edit_focused(|text| {
                text.pop();
            }),
            Enter => app.advance(),
            Esc => app.retreat(),
            _ => {}
        },

        StepKind::Review => match key.code {
            Enter => action = Action::Submit,
            Esc | Backspace => app.retreat(),
            _ => {}
        },
    }
    action
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Local, NaiveDate, TimeZone};
    use pilah_core::{
        CategoryId, Coordinate, Facility, FacilityId, PilahConfig, SchedulingService,
        SchedulingSession, TimeSlotId, WizardController, rank,
    };
    use reqwest::Client;

    use super::*;

    fn fixed_clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).single().unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), app)
    }

    fn type_text(app: &mut App, text: &str) {
        for character in text.chars() {
            let action = press(app, KeyCode::Char(character));
            assert!(matches!(action, Action::None), "{character:?} triggered {action:?}");
        }
    }

    /// An app standing on the waste step of `branch`.
    fn app_on_waste_step(branch: DeliveryBranch) -> App {
        let config = PilahConfig::default();
        let collaborators = Arc::new(pilah_provider_http::plugin(Client::new(), &config));
        let service = Arc::new(SchedulingService::new(collaborators, &config));

        let mut wizard = WizardController::default().with_clock(fixed_clock);
        wizard.set_facilities(rank(
            vec![Facility {
                id: FacilityId("bs-melati".to_owned()),
                name: "Bank Sampah Melati".to_owned(),
                coordinate: Some(Coordinate::new(-6.22, 106.82)),
                contact_phone: None,
                address: None,
            }],
            None,
        ));
        wizard.choose_branch(branch).unwrap();
        wizard.advance().unwrap();
        wizard.set_facility(Some(FacilityId("bs-melati".to_owned())));
        wizard.advance().unwrap();
        wizard.set_scheduled_date(NaiveDate::from_ymd_opt(2025, 3, 11));
        wizard.set_time_slot(Some(TimeSlotId("slot-1000".to_owned())));
        wizard.advance().unwrap();

        App::new(SchedulingSession::new(service, wizard))
    }

    #[test]
    fn self_delivery_step_edits_phone_and_notes() {
        let mut app = app_on_waste_step(DeliveryBranch::SelfDelivery);
        assert_eq!(app.screen(), Screen::Step(StepKind::WasteSelectionReview));
        assert_eq!(app.focus, Focus::List);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Phone);
        type_text(&mut app, "0812-3456-7890");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Notes);
        type_text(&mut app, "quiet gate");
        press(&mut app, KeyCode::Backspace);

        let state = app.state().unwrap();
        assert_eq!(state.contact_phone, "0812-3456-7890");
        assert_eq!(state.notes, "quiet gat");

        assert!(matches!(press(&mut app, KeyCode::Enter), Action::Submit), "enter submits");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focus, Focus::List);
        assert!(matches!(press(&mut app, KeyCode::Char('q')), Action::Quit), "q quits from the list");
    }

    #[test]
    fn list_keys_still_fill_the_basket() {
        let mut app = app_on_waste_step(DeliveryBranch::SelfDelivery);
        let first = app.current_category().unwrap();

        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('+'));

        let state = app.state().unwrap();
        assert_eq!(state.basket.quantity(&first), 2);
        assert!(state.contact_phone.is_empty(), "list keys never reach the text inputs");
        assert!(!state.basket.contains(&CategoryId::new("electronic-baterai")), "only the highlighted row");
    }

    #[test]
    fn pickup_location_starts_on_the_address() {
        let mut app = app_on_waste_step(DeliveryBranch::FacilityPickup);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Step(StepKind::PickupLocation));
        assert_eq!(app.focus, Focus::Address);
        type_text(&mut app, "Jl. Kenanga 12");
        assert_eq!(app.state().unwrap().pickup_address, "Jl. Kenanga 12");
    }
}
