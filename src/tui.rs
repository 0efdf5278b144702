use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use promptmaster_core::{GatewayError, TurnEvent};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

const TICK_INTERVAL: Duration = Duration::from_millis(300);

/// Everything the main loop reacts to: terminal input plus results coming
/// back from background model calls.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    Chat(TurnEvent),
    Generated(Result<String, GatewayError>),
    Executed(String),
    Refined { text: String, elapsed_ms: u128 },
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        spawn_terminal_reader(tx.clone());
        spawn_ticker(tx.clone());
        Self { rx, tx }
    }

    /// Sender for background tasks reporting back to the UI loop
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

fn translate(event: Event) -> Option<AppEvent> {
    match event {
        // Key releases are reported on some platforms; only presses matter
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(width, height) => Some(AppEvent::Resize(width, height)),
        _ => None,
    }
}

fn spawn_terminal_reader(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut stream = event::EventStream::new();
        while let Some(read) = stream.next().await {
            let Some(app_event) = read
                .map_err(|e| tracing::warn!(error = %e, "Terminal event read failed"))
                .ok()
                .and_then(translate)
            else {
                continue;
            };
            // Receiver gone means the UI loop has exited
            if tx.send(app_event).is_err() {
                return;
            }
        }
    });
}

/// Ticks drive the loading animations
fn spawn_ticker(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        while tx.send(AppEvent::Tick).is_ok() {
            interval.tick().await;
        }
    });
}

/// Raw mode plus the alternate screen, drawing to stderr
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stderr))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Leave the alternate screen before the panic message is printed
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Err(e) = restore() {
            eprintln!("failed to restore terminal: {}", e);
        }
        previous(info);
    }));
}
