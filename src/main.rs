use std::sync::Arc;

use anyhow::Result;
use promptmaster_core::{Config, GeminiClient, ModelGateway};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing log file should not keep the app from starting
    if let Err(e) = logging::init() {
        eprintln!("promptmaster: logging disabled: {:#}", e);
    }

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not load config, using defaults");
        Config::new()
    });

    let client = GeminiClient::new(config.resolved_api_key(), config.base_url())?;
    if !client.has_api_key() {
        tracing::warn!("No Gemini API key configured");
    }
    let gateway = Arc::new(ModelGateway::new(Arc::new(client), config.models()));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(config, gateway, events.sender());

    let outcome = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!("Exiting");
    outcome
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
