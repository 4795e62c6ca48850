//! Protocol records.
//!
//! ```text
//! :nick!user@host PRIVMSG #rust :hello there
//! └──── prefix ─┘ └command┘└param┘└ trailing ┘
//! ```

use std::fmt;

/// The record kinds the client acts on. Everything else is carried as
/// `Other` and shown verbatim in the server window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Privmsg,
    Ping,
    Pong,
    Join,
    Nick,
    User,
    Other(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Command::Privmsg => "PRIVMSG",
            Command::Ping => "PING",
            Command::Pong => "PONG",
            Command::Join => "JOIN",
            Command::Nick => "NICK",
            Command::User => "USER",
            Command::Other(name) => name,
        }
    }
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "PRIVMSG" => Command::Privmsg,
            "PING" => Command::Ping,
            "PONG" => Command::Pong,
            "JOIN" => Command::Join,
            "NICK" => Command::Nick,
            "USER" => Command::User,
            _ => Command::Other(name.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a line cannot be turned into a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    MissingCommand,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty line"),
            ParseError::MissingCommand => write!(f, "line has no command"),
        }
    }
}

impl std::error::Error for ParseError {}

/// One decoded or to-be-encoded protocol record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Origin of an inbound record (`nick!user@host` or a server name).
    pub prefix: Option<String>,
    pub command: Command,
    pub params: Vec<String>,
    /// Free-text payload after the ` :` separator.
    pub trailing: Option<String>,
}

impl Message {
    pub fn new(command: Command, params: Vec<String>, trailing: Option<String>) -> Self {
        Self {
            prefix: None,
            command,
            params,
            trailing,
        }
    }

    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new(
            Command::Privmsg,
            vec![target.to_string()],
            Some(text.to_string()),
        )
    }

    pub fn join(channels: &[String]) -> Self {
        Self::new(Command::Join, channels.to_vec(), None)
    }

    pub fn pong(token: &str) -> Self {
        Self::new(Command::Pong, Vec::new(), Some(token.to_string()))
    }

    pub fn nick(nick: &str) -> Self {
        Self::new(Command::Nick, vec![nick.to_string()], None)
    }

    pub fn user(username: &str, realname: &str) -> Self {
        Self::new(
            Command::User,
            vec![username.to_string(), "0".to_string(), "*".to_string()],
            Some(realname.to_string()),
        )
    }

    /// Parse a single line (without its CRLF terminator).
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut rest = line;
        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (p, r) = stripped
                .split_once(' ')
                .ok_or(ParseError::MissingCommand)?;
            prefix = Some(p.to_string());
            rest = r;
        }
        rest = rest.trim_start_matches(' ');

        let mut trailing = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            trailing = Some(stripped.to_string());
            rest = "";
        } else if let Some(idx) = rest.find(" :") {
            trailing = Some(rest[idx + 2..].to_string());
            rest = &rest[..idx];
        }

        let mut tokens = rest.split(' ').filter(|t| !t.is_empty());
        let command = tokens.next().ok_or(ParseError::MissingCommand)?;

        Ok(Self {
            prefix,
            command: Command::from(command),
            params: tokens.map(str::to_string).collect(),
            trailing,
        })
    }

    /// Nick portion of the prefix, if any.
    pub fn source(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .and_then(|p| p.split(['!', '@']).next())
            .filter(|s| !s.is_empty())
    }

    /// The trailing text, or the last parameter when the sender skipped the
    /// colon (some servers send `PING token`).
    pub fn text(&self) -> &str {
        self.trailing
            .as_deref()
            .or(self.params.last().map(String::as_str))
            .unwrap_or("")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        write!(f, "{}", self.command)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{trailing}")?;
        }
        Ok(())
    }
}
