//! # TUI Adapter
//!
//! The ratatui-specific layer: terminal setup, the [`Screen`] view, and the
//! keyboard task. This is the only module that knows about ratatui and
//! crossterm.
//!
//! ## Tasks
//!
//! ```text
//! main task ── run() ──┬── spawn:          EventRouter::run
//!                      ├── spawn_blocking: run_keyboard
//!                      ├── (per connection) inbound tasks
//!                      └── waits for the shutdown token
//! ```
//!
//! ## Redraw Strategy
//!
//! There is no frame timer. A render pass happens when the focused window
//! gets a line, when focus moves, when the input line changes, and on
//! terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

pub mod component;
pub mod components;
pub mod event;
pub mod keyboard;
pub mod screen;

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::core::commands::{Dispatcher, Settings};
use crate::core::config::ResolvedConfig;
use crate::core::connection::{ConnectionPool, TcpDialer};
use crate::core::destination::DestinationRegistry;
use crate::core::display::{Display, lock_display};
use crate::core::router::{self, EventRouter, UiRequest};

pub use screen::Screen;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,                        // Show cursor for input editing
            SetCursorStyle::SteadyBlock, // Non-blinking: avoids blink timer reset on redraw
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            SetCursorStyle::DefaultUserShape,
            Hide
        );
    }
}

/// Runs the client until the quit key is pressed or the terminal fails.
pub async fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let terminal = ratatui::try_init()?;
    let result = run_with_terminal(terminal, config).await;
    ratatui::restore();
    result
}

async fn run_with_terminal(
    terminal: ratatui::DefaultTerminal,
    config: ResolvedConfig,
) -> std::io::Result<()> {
    let _terminal_mode_guard = TerminalModeGuard::new()?;

    let shutdown = CancellationToken::new();
    let (handle, inbox) = router::channel();
    let pool = Arc::new(ConnectionPool::new());
    let display = Display::shared(
        DestinationRegistry::new(config.max_scrollback),
        Screen::new(terminal),
    );

    let dispatcher = Dispatcher::new(
        pool.clone(),
        Arc::new(TcpDialer),
        handle.clone(),
        Settings::from(&config),
        shutdown.clone(),
    );
    let router = EventRouter::new(
        display.clone(),
        inbox,
        dispatcher,
        config.focus_new_windows,
    );

    handle.status(format!(
        "Welcome to switchboard, {}. Type /connect <host> [port] to begin.",
        config.nick
    ));
    lock_display(&display).render();

    let router_task = tokio::spawn(router.run(shutdown.clone()));
    let keyboard_task = tokio::task::spawn_blocking({
        let display = display.clone();
        let pool = pool.clone();
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        move || {
            keyboard::run_keyboard(display, event::CrosstermEvents, pool, handle, shutdown)
        }
    });

    for server in &config.servers {
        handle.ui(UiRequest::Connect(server.clone()));
    }

    shutdown.cancelled().await;
    info!("Shutting down");

    // The router may be inside a connect attempt; don't wait out its timeout
    match tokio::time::timeout(SHUTDOWN_GRACE, router_task).await {
        Ok(Err(e)) => warn!("Router task ended abnormally: {}", e),
        Err(_) => warn!("Router task did not stop within {:?}", SHUTDOWN_GRACE),
        Ok(Ok(())) => {}
    }
    if let Err(e) = keyboard_task.await {
        warn!("Keyboard task ended abnormally: {}", e);
    }
    Ok(())
}
