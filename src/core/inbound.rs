//! # Inbound Tasks
//!
//! One task per connection reads records until the stream ends, a read
//! fails, or shutdown fires. It never touches display state directly:
//! everything it produces goes through the router.
//!
//! ```text
//! reader ──▶ LineCodec ──▶ handle_record
//!                              ├─ PING     ──▶ PONG on the same connection
//!                              ├─ PRIVMSG  ──▶ deliver (channel or sender window)
//!                              └─ anything ──▶ deliver (server window, raw)
//! ```
//!
//! On exit the connection is removed from the pool, so later writes through
//! it fail with [`ConnectionError::Gone`](crate::core::connection::ConnectionError::Gone).

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, info, warn};
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use crate::core::connection::{Connection, ConnectionPool};
use crate::core::destination::DestinationKey;
use crate::core::router::RouterHandle;
use crate::protocol::{Command, LineCodec, Message};

/// Channel names start with one of these.
const CHANNEL_PREFIXES: [char; 4] = ['#', '&', '+', '!'];

pub fn is_channel(name: &str) -> bool {
    name.starts_with(CHANNEL_PREFIXES)
}

/// Window a PRIVMSG belongs in: the channel it was sent to, or the sender
/// when it was addressed to us directly.
pub fn privmsg_destination(conn_id: &str, sender: &str, target: &str) -> DestinationKey {
    if is_channel(target) || sender.is_empty() {
        DestinationKey::new(conn_id, target)
    } else {
        DestinationKey::new(conn_id, sender)
    }
}

/// Starts the read loop for `conn`.
pub fn spawn_inbound(
    conn: Arc<Connection>,
    reader: impl AsyncRead + Unpin + Send + 'static,
    pool: Arc<ConnectionPool>,
    router: RouterHandle,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut records = FramedRead::new(reader, LineCodec::new());
        info!("Inbound task started for {}", conn.id());

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Inbound task for {} stopping on shutdown", conn.id());
                    break;
                }
                next = records.next() => match next {
                    Some(Ok(message)) => handle_record(&conn, message, &router).await,
                    Some(Err(e)) => {
                        warn!("Read from {} failed: {}", conn.id(), e);
                        router.status(format!("Failed to read data from {}: {}", conn.id(), e));
                        break;
                    }
                    None => {
                        router.status(format!("Connection to {} closed", conn.id()));
                        break;
                    }
                },
            }
        }

        pool.remove(conn.id());
        info!("Inbound task finished for {}", conn.id());
    })
}

/// Routes one decoded record.
pub async fn handle_record(conn: &Connection, message: Message, router: &RouterHandle) {
    debug!("<- {}: {}", conn.id(), message);
    match message.command {
        Command::Ping => {
            if let Err(e) = conn.send(Message::pong(message.text())).await {
                router.status(format!("Failed to answer PING from {}: {}", conn.id(), e));
            }
        }
        Command::Privmsg if !message.params.is_empty() => {
            let target = &message.params[0];
            let sender = message.source().unwrap_or_default();
            let key = privmsg_destination(conn.id(), sender, target);
            router.deliver(key, format!("{} @ {}: {}", sender, target, message.text()));
        }
        _ => router.deliver(DestinationKey::server(conn.id()), message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::router::{self, Origin};
    use crate::test_support::{connection_pair, read_line};
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_privmsg_destination() {
        assert_eq!(
            privmsg_destination("irc.a:6667", "alice", "#rust"),
            DestinationKey::new("irc.a:6667", "#rust")
        );
        assert_eq!(
            privmsg_destination("irc.a:6667", "alice", "me"),
            DestinationKey::new("irc.a:6667", "alice")
        );
        assert_eq!(
            privmsg_destination("irc.a:6667", "", "me"),
            DestinationKey::new("irc.a:6667", "me")
        );
    }

    #[tokio::test]
    async fn test_ping_is_answered_on_same_connection() {
        let (conn, mut server) = connection_pair("irc.a:6667", "me");
        let (handle, mut inbox) = router::channel();

        handle_record(&conn, Message::parse("PING :abc123").unwrap(), &handle).await;

        assert_eq!(read_line(&mut server).await, "PONG :abc123\r\n");
        assert!(inbox.drain_deliveries().is_empty());
    }

    #[tokio::test]
    async fn test_ping_without_colon() {
        let (conn, mut server) = connection_pair("irc.a:6667", "me");
        let (handle, _inbox) = router::channel();

        handle_record(&conn, Message::parse("PING token").unwrap(), &handle).await;

        assert_eq!(read_line(&mut server).await, "PONG :token\r\n");
    }

    #[tokio::test]
    async fn test_channel_privmsg_is_delivered_to_channel() {
        let (conn, _server) = connection_pair("irc.a:6667", "me");
        let (handle, mut inbox) = router::channel();

        let msg = Message::parse(":alice!a@host PRIVMSG #rust :hello there").unwrap();
        handle_record(&conn, msg, &handle).await;

        let deliveries = inbox.drain_deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].key, DestinationKey::new("irc.a:6667", "#rust"));
        assert_eq!(deliveries[0].line.as_deref(), Some("alice @ #rust: hello there"));
        assert_eq!(deliveries[0].origin, Origin::Remote);
    }

    #[tokio::test]
    async fn test_other_records_go_to_server_window_raw() {
        let (conn, _server) = connection_pair("irc.a:6667", "me");
        let (handle, mut inbox) = router::channel();

        let msg = Message::parse(":irc.a 001 me :Welcome to the network").unwrap();
        handle_record(&conn, msg, &handle).await;

        let deliveries = inbox.drain_deliveries();
        assert_eq!(deliveries[0].key, DestinationKey::server("irc.a:6667"));
        assert_eq!(
            deliveries[0].line.as_deref(),
            Some(":irc.a 001 me :Welcome to the network")
        );
    }

    #[tokio::test]
    async fn test_stream_end_removes_connection() {
        let (conn, _server) = connection_pair("irc.a:6667", "me");
        let pool = Arc::new(ConnectionPool::new());
        pool.add(conn.clone());
        let (handle, mut inbox) = router::channel();

        let (reader, mut remote) = tokio::io::duplex(1024);
        let task = spawn_inbound(conn.clone(), reader, pool.clone(), handle, CancellationToken::new());

        remote
            .write_all(b":alice!a@h PRIVMSG #rust :one\r\n:alice!a@h PRIVMSG #rust :two\r\n")
            .await
            .unwrap();
        drop(remote);
        task.await.unwrap();

        assert!(pool.is_empty());
        assert!(conn.is_gone());
        let lines: Vec<_> = inbox
            .drain_deliveries()
            .into_iter()
            .filter_map(|d| d.line)
            .collect();
        assert_eq!(lines, vec!["alice @ #rust: one", "alice @ #rust: two"]);
        assert_eq!(inbox.drain_status(), vec!["Connection to irc.a:6667 closed"]);
    }

    #[tokio::test]
    async fn test_non_utf8_byte_keeps_connection() {
        let (conn, _server) = connection_pair("irc.a:6667", "me");
        let pool = Arc::new(ConnectionPool::new());
        pool.add(conn.clone());
        let (handle, mut inbox) = router::channel();

        let (reader, mut remote) = tokio::io::duplex(1024);
        let task = spawn_inbound(conn.clone(), reader, pool.clone(), handle, CancellationToken::new());

        remote
            .write_all(b":bob!u@h PRIVMSG #chan :caf\xe9\r\n:bob!u@h PRIVMSG #chan :still here\r\n")
            .await
            .unwrap();
        let first = inbox.recv_delivery().await.unwrap();
        let second = inbox.recv_delivery().await.unwrap();
        assert_eq!(first.line.as_deref(), Some("bob @ #chan: caf\u{fffd}"));
        assert_eq!(second.line.as_deref(), Some("bob @ #chan: still here"));

        assert!(pool.contains("irc.a:6667"));
        assert!(!conn.is_gone());
        assert!(inbox.drain_status().is_empty());

        drop(remote);
        task.await.unwrap();
        assert_eq!(inbox.drain_status(), vec!["Connection to irc.a:6667 closed"]);
    }

    #[tokio::test]
    async fn test_oversized_line_reports_read_failure() {
        let (conn, _server) = connection_pair("irc.a:6667", "me");
        let pool = Arc::new(ConnectionPool::new());
        pool.add(conn.clone());
        let (handle, mut inbox) = router::channel();

        let junk = vec![b'x'; crate::protocol::codec::MAX_LINE_LENGTH + 10];
        let reader = tokio_test::io::Builder::new().read(&junk).build();
        spawn_inbound(conn, reader, pool.clone(), handle, CancellationToken::new())
            .await
            .unwrap();

        assert!(pool.is_empty());
        let status = inbox.drain_status();
        assert_eq!(status.len(), 1);
        assert!(status[0].starts_with("Failed to read data from irc.a:6667"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let (conn, _server) = connection_pair("irc.a:6667", "me");
        let pool = Arc::new(ConnectionPool::new());
        pool.add(conn.clone());
        let (handle, _inbox) = router::channel();
        let (reader, _remote) = tokio::io::duplex(64);
        let shutdown = CancellationToken::new();

        let task = spawn_inbound(conn, reader, pool.clone(), handle, shutdown.clone());
        shutdown.cancel();
        task.await.unwrap();
        assert!(pool.is_empty());
    }
}
