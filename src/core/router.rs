//! # Event Router
//!
//! The single consumer that owns every change to shared display state.
//!
//! ```text
//!  inbound task (conn A) ─┐
//!  inbound task (conn B) ─┼─ deliver ──┐
//!  dispatcher self-echo ──┘            │
//!  any task ─────────────── status ────┼──▶ EventRouter::run ──▶ Display
//!  keyboard task ────────── ui ────────┘    (one item at a time)
//! ```
//!
//! Each sink is an unbounded queue, so producers never block on the UI.
//! Items from one producer arrive in the order it sent them; items from
//! different producers interleave in arrival order.
//!
//! For every delivered line the router appends it to its window (creating
//! the window on first use) and renders only if that window is focused.
//!
//! Submissions are dispatched inline and in order. Dialing is the exception:
//! connect work runs on its own task and reports back through the sinks, so
//! a slow server never stalls the queues.

use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::core::commands::Dispatcher;
use crate::core::config::ServerEntry;
use crate::core::connection::Connection;
use crate::core::destination::DestinationKey;
use crate::core::display::{SharedDisplay, View, lock_display};

/// Where a delivered line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Received from a server.
    Remote,
    /// Produced by the user's own action (a join, a sent message). A window
    /// created this way may take focus.
    Local,
}

/// A line for a specific window. `line: None` only opens the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub key: DestinationKey,
    pub line: Option<String>,
    pub origin: Origin,
}

/// A line typed by the user, with the routing context captured at submit time.
#[derive(Debug, Clone)]
pub struct InputSubmission {
    pub target: DestinationKey,
    pub text: String,
    pub connection: Option<Arc<Connection>>,
}

/// Requests coming from the UI side.
#[derive(Debug, Clone)]
pub enum UiRequest {
    Submit(InputSubmission),
    FocusNext,
    FocusPrev,
    /// Connect (and join) a configured server.
    Connect(ServerEntry),
}

/// Producer side of the router. Cheap to clone; every task gets one.
#[derive(Clone)]
pub struct RouterHandle {
    status_tx: UnboundedSender<String>,
    deliver_tx: UnboundedSender<Delivery>,
    ui_tx: UnboundedSender<UiRequest>,
}

impl RouterHandle {
    /// Appends a line to the status window.
    pub fn status(&self, text: impl Into<String>) {
        if self.status_tx.send(text.into()).is_err() {
            debug!("Status line dropped: router stopped");
        }
    }

    /// Delivers a line received from a server.
    pub fn deliver(&self, key: DestinationKey, line: impl Into<String>) {
        self.send_delivery(Delivery {
            key,
            line: Some(line.into()),
            origin: Origin::Remote,
        });
    }

    /// Delivers a line produced locally (self-echo, join notices).
    pub fn echo(&self, key: DestinationKey, line: impl Into<String>) {
        self.send_delivery(Delivery {
            key,
            line: Some(line.into()),
            origin: Origin::Local,
        });
    }

    /// Opens a window without writing to it.
    pub fn open(&self, key: DestinationKey) {
        self.send_delivery(Delivery {
            key,
            line: None,
            origin: Origin::Local,
        });
    }

    fn send_delivery(&self, delivery: Delivery) {
        if self.deliver_tx.send(delivery).is_err() {
            debug!("Delivery dropped: router stopped");
        }
    }

    pub fn ui(&self, request: UiRequest) {
        if self.ui_tx.send(request).is_err() {
            debug!("UI request dropped: router stopped");
        }
    }
}

/// Consumer side of the router queues.
pub struct RouterInbox {
    status_rx: UnboundedReceiver<String>,
    deliver_rx: UnboundedReceiver<Delivery>,
    ui_rx: UnboundedReceiver<UiRequest>,
}

impl RouterInbox {
    /// Takes every queued status line.
    pub fn drain_status(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.status_rx.try_recv().ok()).collect()
    }

    /// Takes every queued delivery.
    pub fn drain_deliveries(&mut self) -> Vec<Delivery> {
        std::iter::from_fn(|| self.deliver_rx.try_recv().ok()).collect()
    }

    /// Takes every queued UI request.
    pub fn drain_ui(&mut self) -> Vec<UiRequest> {
        std::iter::from_fn(|| self.ui_rx.try_recv().ok()).collect()
    }

    /// Waits for the next status line.
    pub async fn recv_status(&mut self) -> Option<String> {
        self.status_rx.recv().await
    }

    /// Waits for the next delivery.
    pub async fn recv_delivery(&mut self) -> Option<Delivery> {
        self.deliver_rx.recv().await
    }
}

/// Creates the router queues.
pub fn channel() -> (RouterHandle, RouterInbox) {
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let (deliver_tx, deliver_rx) = mpsc::unbounded_channel();
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    (
        RouterHandle {
            status_tx,
            deliver_tx,
            ui_tx,
        },
        RouterInbox {
            status_rx,
            deliver_rx,
            ui_rx,
        },
    )
}

enum Routed {
    Status(String),
    Delivery(Delivery),
    Ui(UiRequest),
}

pub struct EventRouter<V> {
    display: SharedDisplay<V>,
    inbox: RouterInbox,
    dispatcher: Dispatcher,
    focus_new_windows: bool,
}

impl<V: View> EventRouter<V> {
    pub fn new(
        display: SharedDisplay<V>,
        inbox: RouterInbox,
        dispatcher: Dispatcher,
        focus_new_windows: bool,
    ) -> Self {
        Self {
            display,
            inbox,
            dispatcher,
            focus_new_windows,
        }
    }

    /// Drains the queues one item at a time until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Event router started");
        loop {
            let item = tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(text) = self.inbox.status_rx.recv() => Routed::Status(text),
                Some(delivery) = self.inbox.deliver_rx.recv() => Routed::Delivery(delivery),
                Some(request) = self.inbox.ui_rx.recv() => Routed::Ui(request),
                else => break,
            };
            self.handle(item).await;
        }
        info!("Event router stopped");
    }

    /// Handles everything already queued, without waiting for more.
    /// Returns the number of items handled.
    pub async fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let item = if let Ok(text) = self.inbox.status_rx.try_recv() {
                Routed::Status(text)
            } else if let Ok(delivery) = self.inbox.deliver_rx.try_recv() {
                Routed::Delivery(delivery)
            } else if let Ok(request) = self.inbox.ui_rx.try_recv() {
                Routed::Ui(request)
            } else {
                return handled;
            };
            self.handle(item).await;
            handled += 1;
        }
    }

    pub fn display(&self) -> &SharedDisplay<V> {
        &self.display
    }

    async fn handle(&mut self, item: Routed) {
        match item {
            Routed::Status(text) => {
                self.apply_delivery(Delivery {
                    key: DestinationKey::status(),
                    line: Some(text),
                    origin: Origin::Local,
                });
            }
            Routed::Delivery(delivery) => self.apply_delivery(delivery),
            Routed::Ui(request) => self.apply_ui(request).await,
        }
    }

    fn apply_delivery(&self, delivery: Delivery) {
        let mut display = lock_display(&self.display);
        let (created, focused) = match delivery.line {
            Some(line) => {
                let appended = display.registry.append(&delivery.key, line);
                (appended.created, appended.focused)
            }
            None => {
                let created = display.registry.open(&delivery.key);
                (created, display.registry.is_focused(&delivery.key))
            }
        };

        if created {
            debug!("Window opened: {}", delivery.key);
        }

        if created && delivery.origin == Origin::Local && self.focus_new_windows {
            display.focus(&delivery.key);
            display.render();
        } else if focused {
            display.render();
        }
    }

    async fn apply_ui(&mut self, request: UiRequest) {
        match request {
            UiRequest::Submit(submission) => {
                debug!(
                    "Dispatching input for {}: {:?}",
                    submission.target, submission.text
                );
                // Errors are already reported to the status window
                let _ = self
                    .dispatcher
                    .dispatch(&submission.text, &submission.target, submission.connection)
                    .await;
            }
            UiRequest::FocusNext => {
                let mut display = lock_display(&self.display);
                display.focus_next();
                display.render();
            }
            UiRequest::FocusPrev => {
                let mut display = lock_display(&self.display);
                display.focus_prev();
                display.render();
            }
            UiRequest::Connect(server) => {
                self.dispatcher.spawn_autoconnect(server);
            }
        }
    }
}
