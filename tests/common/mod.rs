//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream};
use tokio_util::sync::CancellationToken;

use switchboard::core::commands::{Dispatcher, Settings};
use switchboard::core::connection::{ConnectionPool, Dialer, Transport};
use switchboard::core::destination::{DestinationKey, DestinationRegistry};
use switchboard::core::display::{Display, SharedDisplay, View, lock_display};
use switchboard::core::router::{self, EventRouter, InputSubmission, RouterHandle, UiRequest};

// ============================================================================
// View
// ============================================================================

/// Counts render passes and remembers the focused key of each.
#[derive(Default)]
pub struct CountingView {
    pub renders: Vec<DestinationKey>,
}

impl View for CountingView {
    fn render(&mut self, registry: &DestinationRegistry) -> io::Result<()> {
        self.renders.push(registry.focused_key().clone());
        Ok(())
    }

    fn focus_changed(&mut self, _key: &DestinationKey) {}
}

// ============================================================================
// Transport
// ============================================================================

pub struct FakeServer {
    pub from_client: BufReader<DuplexStream>,
    pub to_client: DuplexStream,
}

impl FakeServer {
    pub async fn expect_line(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), self.from_client.read_line(&mut line))
            .await
            .expect("timed out waiting for the client")
            .expect("read failed");
        line
    }
}

#[derive(Default)]
pub struct DuplexDialer {
    servers: Mutex<HashMap<String, FakeServer>>,
    hanging: Mutex<HashSet<String>>,
}

impl DuplexDialer {
    /// Dials to `addr` will never complete.
    pub fn hang(&self, addr: &str) {
        self.hanging.lock().unwrap().insert(addr.to_string());
    }

    pub fn server(&self, addr: &str) -> FakeServer {
        self.servers
            .lock()
            .unwrap()
            .remove(addr)
            .unwrap_or_else(|| panic!("{addr} was never dialed"))
    }
}

#[async_trait]
impl Dialer for DuplexDialer {
    async fn dial(&self, addr: &str) -> io::Result<Transport> {
        if self.hanging.lock().unwrap().contains(addr) {
            std::future::pending::<()>().await;
        }
        let (client_reader, to_client) = tokio::io::duplex(64 * 1024);
        let (client_writer, from_client) = tokio::io::duplex(64 * 1024);
        self.servers.lock().unwrap().insert(
            addr.to_string(),
            FakeServer {
                from_client: BufReader::new(from_client),
                to_client,
            },
        );
        Ok(Transport {
            reader: Box::new(client_reader),
            writer: Box::new(client_writer),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub router: EventRouter<CountingView>,
    pub handle: RouterHandle,
    pub dialer: Arc<DuplexDialer>,
    pub pool: Arc<ConnectionPool>,
    pub display: SharedDisplay<CountingView>,
    pub shutdown: CancellationToken,
}

pub fn harness() -> Harness {
    let (handle, inbox) = router::channel();
    let dialer = Arc::new(DuplexDialer::default());
    let pool = Arc::new(ConnectionPool::new());
    let shutdown = CancellationToken::new();
    let settings = Settings {
        nick: "me".to_string(),
        username: "me".to_string(),
        realname: "Me".to_string(),
        default_port: 6667,
        connect_timeout: Duration::from_secs(5),
    };
    let dispatcher = Dispatcher::new(
        pool.clone(),
        dialer.clone(),
        handle.clone(),
        settings,
        shutdown.clone(),
    );
    let display = Display::shared(DestinationRegistry::new(0), CountingView::default());
    Harness {
        router: EventRouter::new(display.clone(), inbox, dispatcher, true),
        handle,
        dialer,
        pool,
        display,
        shutdown,
    }
}

/// Submits `/connect <host>` from the status window and drives the router
/// until the server window opens. Returns the server end with the
/// registration lines already read.
pub async fn connect(h: &mut Harness, host: &str) -> FakeServer {
    let id = format!("{host}:6667");
    h.handle.ui(UiRequest::Submit(InputSubmission {
        target: DestinationKey::status(),
        text: format!("/connect {host}"),
        connection: None,
    }));
    let server_window = DestinationKey::server(id.as_str());
    let display = h.display.clone();
    drain_until(&mut h.router, || !lines_of(&display, &server_window).is_empty()).await;

    let mut server = h.dialer.server(&id);
    assert_eq!(server.expect_line().await, "NICK me\r\n");
    assert_eq!(server.expect_line().await, "USER me 0 * :Me\r\n");
    server
}

/// Lines currently stored for `key`; empty if the window does not exist.
pub fn lines_of<V: View>(display: &SharedDisplay<V>, key: &DestinationKey) -> Vec<String> {
    lock_display(display)
        .registry
        .get(key)
        .map(|sb| sb.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Polls until `check` holds, failing after five seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Drains the router repeatedly until `check` holds, failing after five
/// seconds. For tests that drive the router by hand while inbound tasks run.
pub async fn drain_until<V: View>(router: &mut EventRouter<V>, mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            router.drain_pending().await;
            if check() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
