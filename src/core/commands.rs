//! # Command Dispatch
//!
//! Turns one submitted input line into an action: a protocol write, a new
//! connection, or a local status message.
//!
//! ```text
//! "hello there"        → privmsg hello there
//! "/join #rust #tokio" → join #rust #tokio
//! "/nope"              → "Unknown command: /nope" in the status window
//! ```
//!
//! Handlers live in a static table keyed by exact, case-sensitive name.
//! Every failure is reported to the status window before being returned.
//! `/connect` validates its arguments inline and dials on a spawned task,
//! whose failures are reported the same way.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::{ResolvedConfig, ServerEntry};
use crate::core::connection::{Connection, ConnectionError, ConnectionPool, Dialer};
use crate::core::destination::{DestinationKey, SERVER_WINDOW};
use crate::core::inbound::spawn_inbound;
use crate::core::router::RouterHandle;
use crate::protocol::Message;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum CommandError {
    /// Bad arguments; carries the usage line.
    Usage(&'static str),
    /// The focused window has no live connection to use.
    NoConnection(String),
    /// The focused window cannot receive messages (status or server window).
    NoTarget(String),
    AlreadyConnected(String),
    Connect(ConnectionError),
    Send(ConnectionError),
    UnknownCommand(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Usage(usage) => write!(f, "Usage: /{usage}"),
            CommandError::NoConnection(window) => {
                write!(f, "Not connected: {window} has no live connection")
            }
            CommandError::NoTarget(window) => {
                write!(f, "Cannot send messages to {window}")
            }
            CommandError::AlreadyConnected(addr) => write!(f, "Already connected to {addr}"),
            CommandError::Connect(e) => write!(f, "Failed to connect: {e}"),
            CommandError::Send(e) => write!(f, "Failed to send message: {e}"),
            CommandError::UnknownCommand(name) => write!(f, "Unknown command: /{name}"),
        }
    }
}

impl std::error::Error for CommandError {}

// ============================================================================
// Parsing
// ============================================================================

/// A command name and its whitespace-separated arguments.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedInput<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

/// Splits a raw input line. Plain text becomes `privmsg <text>`; blank input
/// yields `None`.
pub fn parse_input(raw: &str) -> Option<ParsedInput<'_>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.strip_prefix('/') {
        Some(rest) => {
            let mut tokens = rest.split_whitespace();
            let name = tokens.next().unwrap_or("");
            Some(ParsedInput {
                name,
                args: tokens.collect(),
            })
        }
        None => Some(ParsedInput {
            name: "privmsg",
            args: trimmed.split_whitespace().collect(),
        }),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Everything a handler can see.
pub struct CommandContext<'a> {
    pub args: &'a [&'a str],
    pub focused: &'a DestinationKey,
    pub active: Option<&'a Arc<Connection>>,
    pub output: &'a RouterHandle,
    pub env: &'a Dispatcher,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Usage line, without the leading slash.
    fn usage(&self) -> &'static str;

    async fn run(&self, ctx: CommandContext<'_>) -> Result<(), CommandError>;
}

struct ConnectCommand;
struct JoinCommand;
struct PrivmsgCommand;
struct EchoCommand;

static COMMANDS: &[(&str, &dyn CommandHandler)] = &[
    ("connect", &ConnectCommand),
    ("join", &JoinCommand),
    ("j", &JoinCommand),
    ("privmsg", &PrivmsgCommand),
    ("echo", &EchoCommand),
];

pub fn find_handler(name: &str) -> Option<&'static dyn CommandHandler> {
    COMMANDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, handler)| *handler)
}

#[async_trait]
impl CommandHandler for ConnectCommand {
    fn usage(&self) -> &'static str {
        "connect <host> [port]"
    }

    async fn run(&self, ctx: CommandContext<'_>) -> Result<(), CommandError> {
        let (host, port) = match ctx.args {
            [host] => (*host, ctx.env.settings.default_port),
            [host, port] => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| CommandError::Usage(self.usage()))?;
                (*host, port)
            }
            _ => return Err(CommandError::Usage(self.usage())),
        };
        let addr = format!("{host}:{port}");
        if ctx.env.pool.contains(&addr) {
            return Err(CommandError::AlreadyConnected(addr));
        }
        ctx.env.spawn_connect(addr);
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for JoinCommand {
    fn usage(&self) -> &'static str {
        "join <channel>..."
    }

    async fn run(&self, ctx: CommandContext<'_>) -> Result<(), CommandError> {
        if ctx.args.is_empty() {
            return Err(CommandError::Usage(self.usage()));
        }
        let conn = ctx
            .active
            .ok_or_else(|| CommandError::NoConnection(ctx.focused.to_string()))?;
        let channels: Vec<String> = ctx.args.iter().map(|s| s.to_string()).collect();
        ctx.env.join(conn, &channels).await
    }
}

#[async_trait]
impl CommandHandler for PrivmsgCommand {
    fn usage(&self) -> &'static str {
        "privmsg <text>"
    }

    async fn run(&self, ctx: CommandContext<'_>) -> Result<(), CommandError> {
        let focused = ctx.focused;
        let conn = match (focused.connection.as_deref(), ctx.active) {
            (Some(id), Some(conn)) if conn.id() == id && !conn.is_gone() => conn,
            _ => return Err(CommandError::NoConnection(focused.to_string())),
        };
        if focused.name == SERVER_WINDOW {
            return Err(CommandError::NoTarget(focused.to_string()));
        }
        if ctx.args.is_empty() {
            return Err(CommandError::Usage(self.usage()));
        }

        let text = ctx.args.join(" ");
        conn.send(Message::privmsg(&focused.name, &text))
            .await
            .map_err(CommandError::Send)?;
        ctx.output.echo(
            focused.clone(),
            format!("{} @ {}: {}", conn.nick(), focused.name, text),
        );
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for EchoCommand {
    fn usage(&self) -> &'static str {
        "echo <text>"
    }

    async fn run(&self, ctx: CommandContext<'_>) -> Result<(), CommandError> {
        ctx.output.status(ctx.args.join(" "));
        Ok(())
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Identity and connection settings used by handlers.
#[derive(Debug, Clone)]
pub struct Settings {
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub default_port: u16,
    pub connect_timeout: Duration,
}

impl From<&ResolvedConfig> for Settings {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            nick: config.nick.clone(),
            username: config.username.clone(),
            realname: config.realname.clone(),
            default_port: config.default_port,
            connect_timeout: config.connect_timeout,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    pool: Arc<ConnectionPool>,
    dialer: Arc<dyn Dialer>,
    router: RouterHandle,
    settings: Settings,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        pool: Arc<ConnectionPool>,
        dialer: Arc<dyn Dialer>,
        router: RouterHandle,
        settings: Settings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            dialer,
            router,
            settings,
            shutdown,
        }
    }

    /// Runs one input line typed in `focused`. Errors are reported to the
    /// status window and returned.
    pub async fn dispatch(
        &self,
        raw: &str,
        focused: &DestinationKey,
        active: Option<Arc<Connection>>,
    ) -> Result<(), CommandError> {
        let Some(parsed) = parse_input(raw) else {
            return Ok(());
        };
        debug!("Command /{} with {} args", parsed.name, parsed.args.len());

        let result = match find_handler(parsed.name) {
            Some(handler) => {
                handler
                    .run(CommandContext {
                        args: &parsed.args,
                        focused,
                        active: active.as_ref(),
                        output: &self.router,
                        env: self,
                    })
                    .await
            }
            None => Err(CommandError::UnknownCommand(parsed.name.to_string())),
        };
        self.report(result)
    }

    /// Connects a configured server and joins its channels.
    pub async fn autoconnect(&self, server: &ServerEntry) -> Result<(), CommandError> {
        let port = server.port.unwrap_or(self.settings.default_port);
        let addr = format!("{}:{}", server.host, port);
        let result = async {
            let conn = self.connect(&addr).await?;
            if !server.channels.is_empty() {
                self.join(&conn, &server.channels).await?;
            }
            Ok::<(), CommandError>(())
        }
        .await;
        self.report(result)
    }

    /// Runs [`connect`](Self::connect) on its own task. The outcome reaches
    /// the status window through the router; shutdown abandons the attempt.
    pub fn spawn_connect(&self, addr: String) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = this.shutdown.cancelled() => {
                    debug!("Connect to {} abandoned on shutdown", addr);
                }
                result = this.connect(&addr) => {
                    let _ = this.report(result.map(|_| ()));
                }
            }
        })
    }

    /// Runs [`autoconnect`](Self::autoconnect) on its own task.
    pub fn spawn_autoconnect(&self, server: ServerEntry) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = this.shutdown.cancelled() => {
                    debug!("Autoconnect to {} abandoned on shutdown", server.host);
                }
                _ = this.autoconnect(&server) => {}
            }
        })
    }

    fn report(&self, result: Result<(), CommandError>) -> Result<(), CommandError> {
        if let Err(e) = &result {
            warn!("Command failed: {}", e);
            self.router.status(e.to_string());
        }
        result
    }

    /// Dials `addr`, registers, and starts the inbound task.
    pub async fn connect(&self, addr: &str) -> Result<Arc<Connection>, CommandError> {
        if self.pool.contains(addr) {
            return Err(CommandError::AlreadyConnected(addr.to_string()));
        }

        self.router.status(format!("Connecting to {addr}..."));
        let transport =
            match tokio::time::timeout(self.settings.connect_timeout, self.dialer.dial(addr)).await
            {
                Ok(Ok(transport)) => transport,
                Ok(Err(e)) => return Err(CommandError::Connect(ConnectionError::Dial(e))),
                Err(_) => return Err(CommandError::Connect(ConnectionError::Timeout)),
            };

        let conn = Arc::new(Connection::new(
            addr,
            self.settings.nick.as_str(),
            transport.writer,
        ));
        conn.send(Message::nick(&self.settings.nick))
            .await
            .map_err(CommandError::Connect)?;
        conn.send(Message::user(&self.settings.username, &self.settings.realname))
            .await
            .map_err(CommandError::Connect)?;

        if !self.pool.add(conn.clone()) {
            return Err(CommandError::AlreadyConnected(addr.to_string()));
        }
        info!("Connected to {} as {}", addr, self.settings.nick);

        self.router.status(format!("Connected to {addr}"));
        self.router
            .echo(DestinationKey::server(addr), format!("Connected to {addr}"));

        spawn_inbound(
            conn.clone(),
            transport.reader,
            self.pool.clone(),
            self.router.clone(),
            self.shutdown.clone(),
        );
        Ok(conn)
    }

    /// Sends one JOIN for `channels` and opens a window for each.
    pub async fn join(&self, conn: &Connection, channels: &[String]) -> Result<(), CommandError> {
        conn.send(Message::join(channels))
            .await
            .map_err(CommandError::Send)?;
        for channel in channels {
            self.router.echo(
                DestinationKey::new(conn.id(), channel.as_str()),
                format!("Joining {channel}..."),
            );
        }
        Ok(())
    }
}
