use chrono::NaiveDate;
use pilah_core::{
    model::DeliveryBranch,
    steps::StepKind,
    wizard::{WizardController, WizardState},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Focus, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let progress = app.state().map_or_else(
        || "done".to_owned(),
        |state| {
            format!(
                "step {}/{} · {}",
                state.current_step,
                state.step_count(),
                state.step_kind().title()
            )
        },
    );
    let header = Paragraph::new(format!("pilah – schedule a waste pickup · {progress}"))
        .block(Block::default().borders(Borders::ALL).title("Pilah"));
    frame.render_widget(header, *header_area);

    // Main screen
    match (app.screen(), app.session.wizard()) {
        (Screen::Step(step), Ok(wizard)) => match step {
            StepKind::DeliveryChoice => draw_branch_choice(frame, app, wizard, *content_area),
            StepKind::FacilityChoice => draw_facilities(frame, app, wizard, *content_area),
            StepKind::Schedule => draw_schedule(frame, app, wizard, *content_area),
            StepKind::WasteSelection => draw_waste(frame, app, wizard, *content_area),
            StepKind::PickupLocation => draw_pickup_location(frame, app, wizard.state(), *content_area),
            StepKind::Review => draw_summary(frame, app, wizard, *content_area),
            StepKind::WasteSelectionReview => {
                let halves = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(*content_area);
                if let [waste_area, side_area] = halves.as_ref() {
                    draw_waste(frame, app, wizard, *waste_area);
                    draw_self_delivery_side(frame, app, wizard, *side_area);
                }
            }
        },
        _ => draw_done(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen() {
        Screen::Step(StepKind::DeliveryChoice) => "↑/↓ move · Enter choose · q/Esc quit",
        Screen::Step(StepKind::FacilityChoice) => "↑/↓ move · Enter choose · r reload · Esc back · q quit",
        Screen::Step(StepKind::Schedule) => "←/→ date · ↑/↓ time slot · Enter next · Esc back · q quit",
        Screen::Step(StepKind::WasteSelection) => {
            "↑/↓ move · Space select · +/- quantity · Enter next · Esc back · q quit"
        }
        Screen::Step(StepKind::WasteSelectionReview) => {
            if app.is_editing_text() {
                "Type to edit · Tab next field · Enter submit · Esc back to the list · Ctrl-C quit"
            } else {
                "↑/↓ move · Space select · +/- quantity · Tab phone/notes · Enter submit · Esc back · q quit"
            }
        }
        Screen::Step(StepKind::PickupLocation) => {
            "Type to edit · Tab next field · Ctrl-L use my location · Enter next · Esc back · Ctrl-C quit"
        }
        Screen::Step(StepKind::Review) => "Enter submit · Esc back · q quit",
        Screen::Done => "Press any key to exit",
    };

    let validation = app
        .state()
        .and_then(|state| state.validation_error.as_ref())
        .map(|failure| failure.message.clone());
    let problem = app.error_message.clone().or(validation);

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if app.is_locating {
        format!("Finding your location… · {nav_hint}")
    } else if let Some(msg) = &problem {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if problem.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading || app.is_locating {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn draw_branch_choice(frame: &mut Frame<'_>, app: &App, wizard: &WizardController, area: Rect) {
    let chosen = wizard.state().branch;
    let items = DeliveryBranch::ALL
        .iter()
        .enumerate()
        .map(|(idx, branch)| {
            let prefix = if idx == app.branch_index { "> " } else { "  " };
            let mark = if chosen == Some(*branch) { " (chosen)" } else { "" };
            ListItem::new(format!("{prefix}{}{mark}", branch.label()))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("How should your waste reach the facility?"),
        )
        .highlight_style(highlight());

    let mut state = ListState::default();
    state.select(Some(app.branch_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_facilities(frame: &mut Frame<'_>, app: &App, wizard: &WizardController, area: Rect) {
    let title = match app.session.reference() {
        Some(reference) => format!("Facilities near {reference} (nearest first)"),
        None => "Facilities (location unknown, unranked)".to_owned(),
    };

    if wizard.facilities().is_empty() {
        let text = if app.is_loading || app.is_locating {
            "Loading facilities…"
        } else {
            "No facilities available. Press r to retry."
        };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let chosen = wizard.state().facility_id.as_ref();
    let rows = wizard.facilities().iter().enumerate().map(|(idx, ranked)| {
        let facility = &ranked.facility;
        let marker = if chosen == Some(&facility.id) { "*" } else { " " };
        let distance = ranked
            .distance_km
            .map_or_else(|| "–".to_owned(), |km| format!("{km:.1} km"));
        let address = facility.address.clone().unwrap_or_default();

        let mut style = Style::default();
        if idx == app.facility_index {
            style = highlight();
        }
        Row::new(vec![
            Cell::from(marker),
            Cell::from(facility.name.clone()),
            Cell::from(distance),
            Cell::from(address),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(2),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["", "Facility", "Distance", "Address"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn draw_schedule(frame: &mut Frame<'_>, app: &App, wizard: &WizardController, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // date
            Constraint::Min(0),    // slots
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [date_area, slots_area] = chunks else {
        return;
    };

    let now = wizard.now().naive_local();
    let today = now.date();
    let state = wizard.state();
    let date_text = state.scheduled_date.map_or_else(
        || "<press ←/→ to pick a date>".to_owned(),
        |date| {
            format!(
                "{} ({})",
                date.format("%a %d.%m.%Y"),
                relative_day_label(date, today)
            )
        },
    );
    let noun = match state.branch {
        Some(DeliveryBranch::SelfDelivery) => "Drop-off",
        _ => "Pickup",
    };
    let date = Paragraph::new(date_text)
        .block(Block::default().borders(Borders::ALL).title(format!("{noun} date")));
    frame.render_widget(date, *date_area);

    let items = wizard
        .slots()
        .slots()
        .iter()
        .map(|slot| {
            let chosen = state.scheduled_time_slot.as_ref() == Some(&slot.id);
            let available = state
                .scheduled_date
                .is_none_or(|date| wizard.slots().is_available(&slot.id, date, now));
            let prefix = if chosen { "> " } else { "  " };
            let suffix = if available { "" } else { "  (unavailable)" };
            let style = if available {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(format!("{prefix}{}{suffix}", slot.label)).style(style)
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!("{noun} time")))
        .highlight_style(highlight());

    let mut list_state = ListState::default();
    if state.scheduled_time_slot.is_some() {
        list_state.select(Some(app.slot_index));
    }
    frame.render_stateful_widget(list, *slots_area, &mut list_state);
}

fn draw_waste(frame: &mut Frame<'_>, app: &App, wizard: &WizardController, area: Rect) {
    let catalog = wizard.catalog();
    let basket = &wizard.state().basket;

    let items = catalog
        .categories()
        .iter()
        .map(|category| {
            let quantity = basket.quantity(&category.id);
            let check = if quantity > 0 { "[x]" } else { "[ ]" };
            let group = category
                .parent_group_id
                .as_ref()
                .and_then(|group_id| catalog.groups().iter().find(|group| &group.id == group_id))
                .map_or("", |group| group.label.as_str());
            let amount = if quantity > 0 {
                format!("  × {quantity}")
            } else {
                String::new()
            };
            ListItem::new(format!("{check} {group:<11} {}{amount}", category.display_label))
        })
        .collect::<Vec<ListItem<'_>>>();

    let title = format!(
        "Waste ({} kinds, {} units)",
        basket.len(),
        basket.total_units()
    );
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(highlight());

    let mut state = ListState::default();
    if !catalog.categories().is_empty() {
        state.select(Some(app.category_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_pickup_location(frame: &mut Frame<'_>, app: &App, state: &WizardState, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // address
            Constraint::Length(3), // phone
            Constraint::Min(3),    // notes
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [address_area, phone_area, notes_area] = chunks else {
        return;
    };

    let fields = [
        (Focus::Address, "Pickup address", state.pickup_address.as_str(), *address_area),
        (Focus::Phone, "Phone (0812-3456-7890)", state.contact_phone.as_str(), *phone_area),
        (Focus::Notes, "Notes for the facility", state.notes.as_str(), *notes_area),
    ];

    for (field, title, text, field_area) in fields {
        draw_input(frame, app, field, title, text, field_area);
    }
}

fn draw_input(frame: &mut Frame<'_>, app: &App, field: Focus, title: &str, text: &str, area: Rect) {
    let border = if app.focus == field {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let input = Paragraph::new(text.to_owned())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title.to_owned()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(input, area);
}

fn draw_self_delivery_side(frame: &mut Frame<'_>, app: &App, wizard: &WizardController, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // summary
            Constraint::Length(3), // phone
            Constraint::Length(3), // notes
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [summary_area, phone_area, notes_area] = chunks else {
        return;
    };

    let state = wizard.state();
    draw_summary(frame, app, wizard, *summary_area);
    draw_input(frame, app, Focus::Phone, "Phone, optional (0812-3456-7890)", &state.contact_phone, *phone_area);
    draw_input(frame, app, Focus::Notes, "Notes for the facility", &state.notes, *notes_area);
}

fn draw_summary(frame: &mut Frame<'_>, app: &App, wizard: &WizardController, area: Rect) {
    let state = wizard.state();

    let facility = state
        .facility_id
        .as_ref()
        .and_then(|id| app.facility_name(id))
        .unwrap_or_else(|| "<none>".to_owned());
    let when = match (&state.scheduled_date, &state.scheduled_time_slot) {
        (Some(date), Some(slot)) => {
            let label = wizard
                .slots()
                .slot(slot)
                .map_or(slot.0.as_str(), |known| known.label.as_str());
            format!("{} {label}", date.format("%a %d.%m.%Y"))
        }
        _ => "<incomplete>".to_owned(),
    };

    let mut lines = vec![
        Line::from(format!(
            "Method:   {}",
            state.branch.map_or("<none>", DeliveryBranch::label)
        )),
        Line::from(format!("Facility: {facility}")),
        Line::from(format!("When:     {when}")),
    ];
    if state.branch == Some(DeliveryBranch::FacilityPickup) {
        lines.push(Line::from(format!("Address:  {}", state.pickup_address)));
    }
    if !state.contact_phone.is_empty() {
        lines.push(Line::from(format!("Phone:    {}", state.contact_phone)));
    }
    if !state.notes.is_empty() {
        lines.push(Line::from(format!("Notes:    {}", state.notes)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Waste:").style(Style::default().add_modifier(Modifier::BOLD)));
    for (category, quantity) in state.basket.iter() {
        let label = wizard
            .catalog()
            .category(category)
            .map_or(category.0.as_str(), |known| known.display_label.as_str());
        lines.push(Line::from(format!("  {label} × {quantity}")));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Review"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_done(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let text = match &app.receipt {
        Some(receipt) => {
            let request = &receipt.request;
            let verb = match request.branch {
                DeliveryBranch::FacilityPickup => "will collect your waste",
                DeliveryBranch::SelfDelivery => "expects your delivery",
            };
            format!(
                "Request {} saved.\n\n{} {verb} on {} ({}).",
                receipt.stored_id,
                request.facility_name,
                request.scheduled_date.format("%a %d.%m.%Y"),
                request.scheduled_time_slot
            )
        }
        None => "The scheduling session was closed.".to_owned(),
    };
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Done"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    match delta {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days if days > 1 => format!("in {days} days"),
        -1 => "yesterday".to_owned(),
        days => format!("{} days ago", days.abs()),
    }
}
