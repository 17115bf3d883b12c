use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::info;

mod app;
mod client;
mod config;
mod content;
mod handler;
mod history;
mod request;
mod reveal;
mod tui;
mod ui;

use app::{App, REVEAL_INTERVAL};
use client::AssistantClient;
use config::Config;
use history::ChatHistory;
use request::Outcome;
use tui::{AppEvent, EventHandler, Tui};

const TICK_RATE: Duration = Duration::from_millis(300);

enum Step {
    Event(Option<AppEvent>),
    RevealTick,
    Response(Outcome),
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::load().unwrap_or_default();
    let client = AssistantClient::new(&config.resolved_base_url(), config.resolved_api_token());
    let history = ChatHistory::load(history::default_path()?);
    let mut app = App::new(client, history);
    info!(base_url = %config.resolved_base_url(), "starting codequill");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    let mut reveal_timer = tokio::time::interval(REVEAL_INTERVAL);
    reveal_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        // Single-owner concurrency: one terminal event stream, at most one
        // reveal timer, at most one in-flight request. The gated arms keep
        // the idle ones unpolled.
        let step = {
            let revealing = app.reveal_active();
            let in_flight = app.requests.in_flight();
            tokio::select! {
                event = events.next() => Step::Event(event),
                _ = reveal_timer.tick(), if revealing => Step::RevealTick,
                outcome = app.requests.outcome(), if in_flight => Step::Response(outcome),
            }
        };

        match step {
            Step::Event(Some(event)) => handler::handle_event(app, event)?,
            Step::Event(None) => break,
            Step::RevealTick => app.advance_reveal(),
            Step::Response(outcome) => app.on_outcome(outcome),
        }
    }

    Ok(())
}

/// Log to a file under the data dir; stdout/stderr belong to the TUI.
/// Filter via `CODEQUILL_LOG`, default `warn`.
fn init_logging() {
    let Some(log_dir) = dirs::data_dir().map(|d| d.join("codequill")) else {
        return;
    };
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(log_file) = std::fs::File::create(log_dir.join("codequill.log")) else {
        return;
    };

    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("CODEQUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .init();
}
