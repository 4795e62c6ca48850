//! # Screen
//!
//! The ratatui [`View`]: one `Terminal::draw` per render pass.
//!
//! ```text
//! ┌────────────────────────────────┐
//! │ output (focused window tail)   │  Min(0)
//! │                                │
//! ├────────────────────────────────┤
//! │ #rust - irc.a:6667             │  status line, 1 row
//! │ [#rust]> typing here█          │  input line, 1 row
//! └────────────────────────────────┘
//! ```

use std::io;

use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout};

use crate::core::destination::{DestinationKey, DestinationRegistry};
use crate::core::display::View;
use crate::tui::component::Component;
use crate::tui::components::{InputLine, OutputSurface, StatusLine};

pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    pub input: InputLine,
    pub status: StatusLine,
}

impl<B: Backend> Screen<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            input: InputLine::new(""),
            status: StatusLine::default(),
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend + Send> View for Screen<B> {
    fn render(&mut self, registry: &DestinationRegistry) -> io::Result<()> {
        let Self {
            terminal,
            input,
            status,
        } = self;
        terminal
            .draw(|frame| {
                let [output_area, status_area, input_area] = Layout::vertical([
                    Constraint::Min(0),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .areas(frame.area());

                OutputSurface::new(registry.focused_scrollback()).render(frame, output_area);
                status.render(frame, status_area);
                input.render(frame, input_area);
            })
            .map(|_| ())
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn focus_changed(&mut self, key: &DestinationKey) {
        self.input.target = key.name.clone();
        self.status.text = key.to_string();
    }
}
