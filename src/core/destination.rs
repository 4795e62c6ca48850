//! # Destinations
//!
//! A destination is anything that gets its own window: a channel, a peer,
//! a connection's server messages, or the local status window.
//!
//! ```text
//! DestinationRegistry
//! ├── (None, "status")               ← always present, focused at startup
//! ├── (Some("irc.a:6667"), "server")
//! ├── (Some("irc.a:6667"), "#rust")
//! └── (Some("irc.b:6667"), "alice")
//! ```
//!
//! Entries are created lazily and never removed. Creation order is kept so
//! focus can cycle through windows the way they were opened.

use std::collections::HashMap;
use std::fmt;

use crate::core::scrollback::Scrollback;

/// Name of the connection-less status window.
pub const STATUS_WINDOW: &str = "status";
/// Name of the per-connection window for non-message traffic.
pub const SERVER_WINDOW: &str = "server";

/// Identifies a window: (connection address, destination name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationKey {
    /// Address of the owning connection; `None` for the status window.
    pub connection: Option<String>,
    pub name: String,
}

impl DestinationKey {
    pub fn status() -> Self {
        Self {
            connection: None,
            name: STATUS_WINDOW.to_string(),
        }
    }

    pub fn new(connection: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            connection: Some(connection.into()),
            name: name.into(),
        }
    }

    pub fn server(connection: impl Into<String>) -> Self {
        Self::new(connection, SERVER_WINDOW)
    }

    pub fn is_status(&self) -> bool {
        self.connection.is_none()
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.connection {
            Some(conn) => write!(f, "{} - {}", self.name, conn),
            None => write!(f, "{} - switchboard", self.name),
        }
    }
}

/// Outcome of [`DestinationRegistry::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// The window did not exist before this line.
    pub created: bool,
    /// The window is the one currently displayed.
    pub focused: bool,
}

/// All windows, their scrollback, and which one is focused.
pub struct DestinationRegistry {
    entries: Vec<(DestinationKey, Scrollback)>,
    index: HashMap<DestinationKey, usize>,
    focused: usize,
    max_lines: usize,
}

impl DestinationRegistry {
    /// Creates a registry holding only the status window, focused.
    pub fn new(max_lines: usize) -> Self {
        let status = DestinationKey::status();
        let mut index = HashMap::new();
        index.insert(status.clone(), 0);
        Self {
            entries: vec![(status, Scrollback::new(max_lines))],
            index,
            focused: 0,
            max_lines,
        }
    }

    /// Returns the entry index for `key`, creating the window if needed.
    fn ensure(&mut self, key: &DestinationKey) -> (usize, bool) {
        if let Some(&idx) = self.index.get(key) {
            return (idx, false);
        }
        let idx = self.entries.len();
        self.entries
            .push((key.clone(), Scrollback::new(self.max_lines)));
        self.index.insert(key.clone(), idx);
        (idx, true)
    }

    /// Creates the window if it does not exist yet. Returns whether it was created.
    pub fn open(&mut self, key: &DestinationKey) -> bool {
        self.ensure(key).1
    }

    /// Appends a line to the window for `key`, creating it on first use.
    pub fn append(&mut self, key: &DestinationKey, line: impl Into<String>) -> Appended {
        let (idx, created) = self.ensure(key);
        self.entries[idx].1.push(line);
        Appended {
            created,
            focused: idx == self.focused,
        }
    }

    pub fn get(&self, key: &DestinationKey) -> Option<&Scrollback> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn focused_key(&self) -> &DestinationKey {
        &self.entries[self.focused].0
    }

    pub fn focused_scrollback(&self) -> &Scrollback {
        &self.entries[self.focused].1
    }

    pub fn is_focused(&self, key: &DestinationKey) -> bool {
        self.focused_key() == key
    }

    /// Focuses an existing window. Returns false if `key` is unknown.
    pub fn focus(&mut self, key: &DestinationKey) -> bool {
        match self.index.get(key) {
            Some(&idx) => {
                self.focused = idx;
                true
            }
            None => false,
        }
    }

    /// Moves focus to the next window, wrapping around.
    pub fn focus_next(&mut self) -> &DestinationKey {
        self.focused = (self.focused + 1) % self.entries.len();
        self.focused_key()
    }

    /// Moves focus to the previous window, wrapping around.
    pub fn focus_prev(&mut self) -> &DestinationKey {
        self.focused = (self.focused + self.entries.len() - 1) % self.entries.len();
        self.focused_key()
    }
}
