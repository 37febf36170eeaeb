//! Terminal setup and the main event loop.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info};

use memtui_core::Config;

use super::app::App;
use super::clipboard::SystemClipboard;
use super::message::Message;
use super::scheduler::Scheduler;
use super::ui;

type Backend = CrosstermBackend<io::Stdout>;

/// Main entry point for the terminal UI.
///
/// Takes over the terminal, connects to the configured server and runs the
/// event loop until the user quits. The terminal is restored on every exit
/// path.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<Backend>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms.max(10));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut scheduler = Scheduler::new(tx, Arc::new(SystemClipboard::new()));
    let mut app = App::new(config);

    let size = terminal.size()?;
    app.update(Message::Resize(size.width, size.height));
    scheduler.submit(app.init());

    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        while let Ok(completion) = rx.try_recv() {
            if let Some(message) = scheduler.accept(completion) {
                let command = app.update(message);
                scheduler.submit(command);
            }
        }

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            let message = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => Some(Message::Key(key)),
                Event::Resize(width, height) => Some(Message::Resize(width, height)),
                _ => None,
            };
            if let Some(message) = message {
                let command = app.update(message);
                scheduler.submit(command);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.update(Message::Tick);
            last_tick = Instant::now();
        }

        if app.should_quit() {
            break;
        }
    }

    debug!(pending = scheduler.pending(), "shutting down scheduler");
    scheduler.shutdown();
    info!("exiting");
    Ok(())
}
