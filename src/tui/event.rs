use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    // Handled by the keyboard task
    Quit,
    Submit,
    FocusNext,
    FocusPrev,
    Resize,

    // Input line edits
    InputChar(char),
    Paste(String),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
}

/// Where terminal events come from. Blocking; called from a dedicated thread.
pub trait EventSource: Send {
    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing
    /// relevant arrived in time.
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<TuiEvent>>;
}

/// Reads events from the real terminal.
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<TuiEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let raw = event::read()?;
        if let Event::Key(key) = &raw {
            log::trace!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
        }
        Ok(translate(raw))
    }
}

/// Maps a crossterm event to a `TuiEvent`. Key releases and repeats reported
/// by enhanced keyboard protocols are ignored.
pub fn translate(raw: Event) -> Option<TuiEvent> {
    match raw {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            match (key.modifiers, key.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::Quit),
                (KeyModifiers::CONTROL, KeyCode::Char('n')) => Some(TuiEvent::FocusNext),
                (KeyModifiers::CONTROL, KeyCode::Char('p')) => Some(TuiEvent::FocusPrev),
                (m, KeyCode::Char(_))
                    if m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    None
                }
                (_, KeyCode::Char(c)) => Some(TuiEvent::InputChar(c)),
                (_, KeyCode::Enter) => Some(TuiEvent::Submit),
                (_, KeyCode::Esc) => Some(TuiEvent::Quit),
                (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
                (_, KeyCode::Delete) => Some(TuiEvent::Delete),
                (_, KeyCode::Left) => Some(TuiEvent::CursorLeft),
                (_, KeyCode::Right) => Some(TuiEvent::CursorRight),
                (_, KeyCode::Home) => Some(TuiEvent::CursorHome),
                (_, KeyCode::End) => Some(TuiEvent::CursorEnd),
                _ => None,
            }
        }
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(..) => Some(TuiEvent::Resize),
        _ => None,
    }
}
