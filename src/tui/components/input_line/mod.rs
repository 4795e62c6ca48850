//! # InputLine Component
//!
//! The single-line editor at the bottom of the screen.
//!
//! ```text
//! [#rust]> hello wor█
//! └──┬───┘
//!  target label (mirrors the focused window)
//! ```
//!
//! ## Responsibilities
//!
//! - Capture text input and paste
//! - Handle editing (backspace, delete, cursor movement)
//! - Handle submission (Enter), which clears the buffer
//! - Scroll horizontally when the text is wider than the line
//!
//! The buffer is internal state. `target` is a prop set whenever focus moves.

mod cursor;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::{CursorState, next_char_boundary, prev_char_boundary, visible_slice};

/// High-level events emitted by the InputLine
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    /// Text or cursor changed; a redraw is needed
    ContentChanged,
}

pub struct InputLine {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// Name of the window input goes to (Prop)
    pub target: String,
    cursor: CursorState,
}

impl InputLine {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            target: target.into(),
            cursor: CursorState::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor.reset();
    }

    /// Cursor position as a byte offset into `buffer`.
    pub fn cursor_pos(&self) -> usize {
        self.cursor.pos
    }

    fn prompt(&self) -> String {
        format!("[{}]> ", self.target)
    }
}

impl Component for InputLine {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let prompt = self.prompt();
        let area_width = usize::from(area.width);
        let prompt_width = prompt.width().min(area_width);
        let text_width = area_width - prompt_width;
        self.cursor.update_scroll(&self.buffer, text_width);

        let visible = visible_slice(&self.buffer, self.cursor.scroll, text_width);
        let line = Line::from(vec![
            Span::styled(prompt, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(visible),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let offset = self.cursor.column(&self.buffer) - self.cursor.scroll;
        // Clamped to the last column, so the cast cannot truncate
        let cursor_x = (prompt_width + offset).min(area_width - 1) as u16;
        frame.set_cursor_position((area.x + cursor_x, area.y));
    }
}

impl EventHandler for InputLine {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor.pos, *c);
                self.cursor.pos += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                // One line only: the protocol has no way to carry a newline
                let flat = text.replace(['\r', '\n'], " ");
                self.buffer.insert_str(self.cursor.pos, &flat);
                self.cursor.pos += flat.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                if self.cursor.pos > 0 {
                    let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                    self.buffer.drain(prev..self.cursor.pos);
                    self.cursor.pos = prev;
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::Delete => {
                if self.cursor.pos < self.buffer.len() {
                    let next = next_char_boundary(&self.buffer, self.cursor.pos);
                    self.buffer.drain(self.cursor.pos..next);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorLeft => (self.cursor.pos > 0).then(|| {
                self.cursor.pos = prev_char_boundary(&self.buffer, self.cursor.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.cursor.pos < self.buffer.len()).then(|| {
                self.cursor.pos = next_char_boundary(&self.buffer, self.cursor.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => (self.cursor.pos != 0).then(|| {
                self.cursor.pos = 0;
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorEnd => (self.cursor.pos != self.buffer.len()).then(|| {
                self.cursor.pos = self.buffer.len();
                InputEvent::ContentChanged
            }),
            TuiEvent::Submit => {
                if !self.buffer.trim().is_empty() {
                    let text = std::mem::take(&mut self.buffer);
                    self.cursor.reset();
                    Some(InputEvent::Submit(text))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
