//! Terminal UI for pilah that walks users through scheduling a waste pickup
//! or drop-off at a nearby facility.

mod app;
mod input;
mod ui;

use std::{fs, io, sync::Arc, time::Duration as StdDuration};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pilah_core::{
    config::PilahConfig,
    feed::{FacilityResponse, FacilityTicket},
    service::SchedulingService,
    session::SchedulingSession,
    wizard::WizardController,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let config = PilahConfig::from_env();
    let _log_guard = init_logging(&config)?;

    // HTTP + service setup
    let client = Client::builder().user_agent("pilah/0.1").build()?;
    let collaborators = Arc::new(pilah_provider_http::plugin(client, &config));
    let service = Arc::new(SchedulingService::new(collaborators, &config));

    // App state
    let mut session = SchedulingSession::new(service, WizardController::default());
    session.start_locating();
    let app = App::new(session);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

/// Log to a daily rolling file; the terminal belongs to the UI.
fn init_logging(config: &PilahConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.log_dir)?;
    let appender = tracing_appender::rolling::daily(&config.log_dir, "pilah-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!(api = %config.api_url, "pilah-tui starting");
    Ok(guard)
}

/// Run a facility retrieval in the background and hand the answer back to
/// the event loop.
fn spawn_fetch(
    app: &mut App,
    ticket: FacilityTicket,
    answers: &mpsc::UnboundedSender<FacilityResponse>,
) {
    app.is_loading = true;
    let service = Arc::clone(app.session.service());
    let answers = answers.clone();
    tokio::spawn(async move {
        let response = service.fetch_facilities(ticket).await;
        if answers.send(response).is_err() {
            tracing::debug!("facility answer arrived after the UI closed");
        }
    });
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    let (answers, mut arrivals) = mpsc::unbounded_channel::<FacilityResponse>();

    loop {
        app.is_locating = app.session.location_pending();

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        if app.session.location_ready() {
            let ticket = app.session.finish_locating().await;
            app.is_locating = false;
            spawn_fetch(&mut app, ticket, &answers);
        }

        while let Ok(response) = arrivals.try_recv() {
            // answers outliving a submitted session are dropped
            if !app.session.is_open() {
                app.is_loading = false;
                continue;
            }
            match app.session.apply_facilities(response) {
                Ok(true) => {
                    app.is_loading = false;
                    app.facility_index = 0;
                }
                Ok(false) => {}
                Err(err) => {
                    app.is_loading = false;
                    app.error_message = Some(format!("Failed to load facilities: {err}"));
                }
            }
        }

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => {
                    app.session.abandon();
                    break;
                }
                Action::None => {}
                Action::RefreshFacilities => {
                    if app.session.location_pending() {
                        app.error_message = Some("Still looking for your location".into());
                        continue;
                    }
                    app.error_message = None;
                    let reference = app.session.reference();
                    let ticket = app.session.set_reference(reference);
                    spawn_fetch(&mut app, ticket, &answers);
                }
                Action::SuggestAddress => {
                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let address = app.session.suggest_address().await;

                    app.is_loading = false;
                    if address.is_empty() {
                        app.error_message =
                            Some("Could not find an address for your location, please type it".into());
                    } else if let Ok(wizard) = app.session.wizard_mut() {
                        wizard.set_pickup_address(address);
                    }
                }
                Action::Submit => {
                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let outcome = app.session.submit().await;

                    app.is_loading = false;
                    if let Some(receipt) = app.report(outcome) {
                        app.receipt = Some(receipt);
                    }
                }
            }
        }
    }

    Ok(())
}
