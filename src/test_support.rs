//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ratatui::buffer::Buffer;
use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream};
use tokio_util::sync::CancellationToken;

use crate::core::commands::{Dispatcher, Settings};
use crate::core::connection::{Connection, ConnectionPool, Dialer, Transport};
use crate::core::destination::{DestinationKey, DestinationRegistry};
use crate::core::display::{Display, View};
use crate::core::router::{self, EventRouter, RouterHandle, RouterInbox};
use crate::tui::event::{EventSource, TuiEvent};

/// One recorded render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub key: DestinationKey,
    pub lines: Vec<String>,
}

/// A view that records what it would have drawn.
pub struct RecordingView {
    pub height: usize,
    pub frames: Vec<Frame>,
    /// `key.to_string()` for every focus change, in order.
    pub labels: Vec<String>,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            height: 24,
            frames: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl View for RecordingView {
    fn render(&mut self, registry: &DestinationRegistry) -> io::Result<()> {
        self.frames.push(Frame {
            key: registry.focused_key().clone(),
            lines: registry
                .focused_scrollback()
                .visible_tail(self.height)
                .map(str::to_string)
                .collect(),
        });
        Ok(())
    }

    fn focus_changed(&mut self, key: &DestinationKey) {
        self.labels.push(key.to_string());
    }
}

/// The far end of a dialed in-memory transport.
pub struct MemoryServer {
    /// What the client wrote.
    pub incoming: BufReader<DuplexStream>,
    /// Bytes written here are read by the client.
    pub outgoing: DuplexStream,
}

/// A dialer backed by `tokio::io::duplex` pairs.
#[derive(Default)]
pub struct MemoryDialer {
    servers: Mutex<HashMap<String, MemoryServer>>,
    dialed: Mutex<Vec<String>>,
    fail_next: Mutex<bool>,
    hang_next: Mutex<bool>,
}

impl MemoryDialer {
    /// Makes the next dial fail with `ConnectionRefused`.
    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    /// Makes the next dial never complete.
    pub fn hang_next(&self) {
        *self.hang_next.lock().unwrap() = true;
    }

    /// Addresses dialed so far, including failed attempts.
    pub fn dialed(&self) -> Vec<String> {
        self.dialed.lock().unwrap().clone()
    }

    pub fn take_server(&self, addr: &str) -> Option<MemoryServer> {
        self.servers.lock().unwrap().remove(addr)
    }
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, addr: &str) -> io::Result<Transport> {
        self.dialed.lock().unwrap().push(addr.to_string());
        if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }
        if std::mem::take(&mut *self.hang_next.lock().unwrap()) {
            std::future::pending::<()>().await;
        }

        let (client_reader, server_writer) = tokio::io::duplex(64 * 1024);
        let (client_writer, server_reader) = tokio::io::duplex(64 * 1024);
        self.servers.lock().unwrap().insert(
            addr.to_string(),
            MemoryServer {
                incoming: BufReader::new(server_reader),
                outgoing: server_writer,
            },
        );
        Ok(Transport {
            reader: Box::new(client_reader),
            writer: Box::new(client_writer),
        })
    }
}

/// A connection whose writes can be read back from the returned stream.
pub fn connection_pair(
    id: impl Into<String>,
    nick: &str,
) -> (Arc<Connection>, BufReader<DuplexStream>) {
    let (writer, server) = tokio::io::duplex(64 * 1024);
    (
        Arc::new(Connection::new(id, nick, writer)),
        BufReader::new(server),
    )
}

/// Reads one line, terminator included. Fails the test after five seconds.
pub async fn read_line(reader: &mut BufReader<DuplexStream>) -> String {
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("timed out waiting for a line")
        .expect("read failed");
    line
}

/// Receives status lines up to and including the first starting with
/// `prefix`. Fails the test after five seconds.
pub async fn status_until(inbox: &mut RouterInbox, prefix: &str) -> Vec<String> {
    let mut lines = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(line) = inbox.recv_status().await {
            let done = line.starts_with(prefix);
            lines.push(line);
            if done {
                break;
            }
        }
    })
    .await
    .expect("timed out waiting for status");
    lines
}

pub fn test_settings() -> Settings {
    Settings {
        nick: "tester".to_string(),
        username: "tester".to_string(),
        realname: "Tester".to_string(),
        default_port: 6667,
        connect_timeout: Duration::from_secs(5),
    }
}

/// A dispatcher over an in-memory dialer and an empty pool.
pub fn test_dispatcher(
    handle: RouterHandle,
    shutdown: CancellationToken,
) -> (Dispatcher, Arc<MemoryDialer>, Arc<ConnectionPool>) {
    let dialer = Arc::new(MemoryDialer::default());
    let pool = Arc::new(ConnectionPool::new());
    let dispatcher = Dispatcher::new(
        pool.clone(),
        dialer.clone(),
        handle,
        test_settings(),
        shutdown,
    );
    (dispatcher, dialer, pool)
}

/// A router drawing into a [`RecordingView`], with unbounded scrollback.
pub fn test_router(
    focus_new_windows: bool,
) -> (EventRouter<RecordingView>, RouterHandle, Arc<MemoryDialer>) {
    let (handle, inbox) = router::channel();
    let (dispatcher, dialer, _pool) = test_dispatcher(handle.clone(), CancellationToken::new());
    let display = Display::shared(DestinationRegistry::new(0), RecordingView::default());
    (
        EventRouter::new(display, inbox, dispatcher, focus_new_windows),
        handle,
        dialer,
    )
}

/// Rows of a rendered buffer, trailing spaces trimmed.
pub fn buffer_lines(buffer: &Buffer) -> Vec<String> {
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| {
            row.iter()
                .map(|cell| cell.symbol())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

/// An event source that replays a fixed script, then reports Quit.
pub struct ScriptedEvents {
    events: VecDeque<TuiEvent>,
    fail: bool,
}

impl ScriptedEvents {
    pub fn new(events: Vec<TuiEvent>) -> Self {
        Self {
            events: events.into(),
            fail: false,
        }
    }

    /// A source whose first poll fails.
    pub fn failing() -> Self {
        Self {
            events: VecDeque::new(),
            fail: true,
        }
    }
}

impl EventSource for ScriptedEvents {
    fn next_event(&mut self, _timeout: Duration) -> io::Result<Option<TuiEvent>> {
        if self.fail {
            return Err(io::Error::other("terminal went away"));
        }
        Ok(Some(self.events.pop_front().unwrap_or(TuiEvent::Quit)))
    }
}
