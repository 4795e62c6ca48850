//! # Keyboard Task
//!
//! A blocking loop (run under `spawn_blocking`) that polls terminal events
//! with a short timeout so it notices shutdown promptly.
//!
//! - Edits go straight to the input line under the display lock, followed
//!   by one render pass.
//! - Submissions and focus requests go to the router; the keyboard task never
//!   touches the registry itself.
//! - The quit key cancels the shutdown token.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use ratatui::backend::Backend;
use tokio_util::sync::CancellationToken;

use crate::core::connection::ConnectionPool;
use crate::core::display::{SharedDisplay, lock_display};
use crate::core::router::{InputSubmission, RouterHandle, UiRequest};
use crate::tui::component::EventHandler;
use crate::tui::components::InputEvent;
use crate::tui::event::{EventSource, TuiEvent};
use crate::tui::screen::Screen;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run_keyboard<B: Backend + Send>(
    display: SharedDisplay<Screen<B>>,
    mut events: impl EventSource,
    pool: Arc<ConnectionPool>,
    router: RouterHandle,
    shutdown: CancellationToken,
) {
    info!("Keyboard task started");

    while !shutdown.is_cancelled() {
        let event = match events.next_event(POLL_INTERVAL) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                error!("Failed to read terminal events: {}", e);
                shutdown.cancel();
                break;
            }
        };

        match event {
            TuiEvent::Quit => {
                info!("Quit requested");
                shutdown.cancel();
            }
            TuiEvent::FocusNext => router.ui(UiRequest::FocusNext),
            TuiEvent::FocusPrev => router.ui(UiRequest::FocusPrev),
            TuiEvent::Resize => lock_display(&display).render(),
            edit => {
                let submitted = {
                    let mut display = lock_display(&display);
                    match display.view.input.handle_event(&edit) {
                        Some(InputEvent::Submit(text)) => {
                            display.render();
                            Some((text, display.registry.focused_key().clone()))
                        }
                        Some(InputEvent::ContentChanged) => {
                            display.render();
                            None
                        }
                        None => None,
                    }
                };

                // Resolved outside the display lock; the pool has its own
                if let Some((text, target)) = submitted {
                    let connection = pool.active_for(&target);
                    debug!(
                        "Submitting to {} via {:?}",
                        target,
                        connection.as_ref().map(|c| c.id())
                    );
                    router.ui(UiRequest::Submit(InputSubmission {
                        target,
                        text,
                        connection,
                    }));
                }
            }
        }
    }

    info!("Keyboard task stopped");
}
