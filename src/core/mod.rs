//! # Core Application Logic
//!
//! Connections, routing and window state. Nothing here knows which terminal
//! library draws the result; rendering goes through the [`display::View`]
//! trait.
//!
//! ```text
//!   server A ──▶ inbound task ─┐
//!   server B ──▶ inbound task ─┤                       ┌──────────────┐
//!                              ├──▶ EventRouter ──────▶│   Display    │
//!   keyboard ──▶ submit/focus ─┘        │              │ registry +   │
//!                                       ▼              │ View (TUI)   │
//!                                  Dispatcher          └──────────────┘
//!                                       │
//!                                       └──▶ ConnectionPool ──▶ servers
//! ```
//!
//! ## Modules
//!
//! - [`config`]: TOML config file, CLI overrides, resolved settings
//! - [`connection`]: `Connection`, `ConnectionPool`, the `Dialer` seam
//! - [`inbound`]: per-connection read loop
//! - [`router`]: the single consumer for all display mutations
//! - [`commands`]: input parsing and the command table
//! - [`destination`] / [`scrollback`]: windows and their history
//! - [`display`]: shared display state and the `View` trait

pub mod commands;
pub mod config;
pub mod connection;
pub mod destination;
pub mod display;
pub mod inbound;
pub mod router;
pub mod scrollback;

pub use connection::{Connection, ConnectionPool};
pub use destination::{DestinationKey, DestinationRegistry};
pub use router::{EventRouter, RouterHandle};
