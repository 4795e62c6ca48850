//! # Connections
//!
//! A [`Connection`] is the write side of one server link. The read side is
//! owned by that connection's inbound task (see `core::inbound`), so reads
//! never contend with writes.
//!
//! ```text
//! ConnectionPool ── Mutex<Vec<Arc<Connection>>>
//!                        │
//!        ┌───────────────┼───────────────┐
//!        ▼               ▼               ▼
//!   dispatcher      inbound task     keyboard task
//!   (PRIVMSG,       (PONG replies)   (picks the active
//!    JOIN)                            connection)
//! ```
//!
//! The pool lock is only held to mutate or copy the list. Callers iterate a
//! snapshot, so `remove` can never be observed halfway through a write.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::SinkExt;
use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::FramedWrite;

use crate::core::destination::DestinationKey;
use crate::protocol::{CodecError, LineCodec, Message};

pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Errors from dialing or writing to a server.
#[derive(Debug)]
pub enum ConnectionError {
    /// The connection was removed from the pool after a fatal read error.
    Gone(String),
    Dial(io::Error),
    Timeout,
    Codec(CodecError),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Gone(id) => write!(f, "connection to {id} is gone"),
            ConnectionError::Dial(e) => write!(f, "{e}"),
            ConnectionError::Timeout => write!(f, "timed out"),
            ConnectionError::Codec(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// One live server link.
pub struct Connection {
    /// `host:port` as dialed; unique within the pool.
    id: String,
    /// Nick sent at registration, used for self-echo.
    nick: String,
    writer: tokio::sync::Mutex<FramedWrite<BoxedWriter, LineCodec>>,
    gone: AtomicBool,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        nick: impl Into<String>,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        let writer: BoxedWriter = Box::new(writer);
        Self {
            id: id.into(),
            nick: nick.into(),
            writer: tokio::sync::Mutex::new(FramedWrite::new(writer, LineCodec::new())),
            gone: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn is_gone(&self) -> bool {
        self.gone.load(Ordering::Acquire)
    }

    fn mark_gone(&self) {
        self.gone.store(true, Ordering::Release);
    }

    /// Encodes and writes one record. Waits for the transport to accept it,
    /// so a slow server applies backpressure to the caller.
    pub async fn send(&self, message: Message) -> Result<(), ConnectionError> {
        if self.is_gone() {
            return Err(ConnectionError::Gone(self.id.clone()));
        }
        debug!("-> {}: {}", self.id, message);
        let mut writer = self.writer.lock().await;
        writer.send(message).await.map_err(ConnectionError::Codec)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("nick", &self.nick)
            .field("gone", &self.is_gone())
            .finish()
    }
}

/// The set of live connections.
#[derive(Default)]
pub struct ConnectionPool {
    connections: Mutex<Vec<Arc<Connection>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Connection>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a connection. Returns false (and changes nothing) if a
    /// connection with the same id is already present.
    pub fn add(&self, conn: Arc<Connection>) -> bool {
        let mut connections = self.lock();
        if connections.iter().any(|c| c.id == conn.id) {
            return false;
        }
        info!("Connection added: {}", conn.id);
        connections.push(conn);
        true
    }

    /// Snapshot of the current connections.
    pub fn list(&self) -> Vec<Arc<Connection>> {
        self.lock().clone()
    }

    /// Unregisters a connection and marks it gone so later writes fail.
    pub fn remove(&self, id: &str) -> Option<Arc<Connection>> {
        let mut connections = self.lock();
        let idx = connections.iter().position(|c| c.id == id)?;
        let conn = connections.remove(idx);
        conn.mark_gone();
        info!("Connection removed: {}", id);
        Some(conn)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.lock().iter().find(|c| c.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|c| c.id == id)
    }

    pub fn first(&self) -> Option<Arc<Connection>> {
        self.lock().first().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The connection commands typed in `key`'s window should use: the
    /// window's own connection, or the oldest connection for the status
    /// window. `None` when the window's connection has been removed.
    pub fn active_for(&self, key: &DestinationKey) -> Option<Arc<Connection>> {
        match &key.connection {
            Some(id) => self.get(id),
            None => self.first(),
        }
    }
}

/// Both halves of a freshly dialed transport.
pub struct Transport {
    pub reader: BoxedReader,
    pub writer: BoxedWriter,
}

/// Opens transports to servers.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, addr: &str) -> io::Result<Transport>;
}

/// Plain TCP.
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, addr: &str) -> io::Result<Transport> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(Transport {
            reader: Box::new(reader),
            writer: Box::new(writer),
        })
    }
}
