//! # StatusLine Component
//!
//! One reversed row between the output and the input line naming the
//! focused window: `"#rust - irc.libera.chat:6667"`.
//!
//! Stateless: the text is a prop, rewritten by the screen whenever focus
//! moves.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;

#[derive(Debug, Default)]
pub struct StatusLine {
    pub text: String,
}

impl StatusLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Component for StatusLine {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let style = Style::default().add_modifier(Modifier::REVERSED);
        let status = Paragraph::new(format!(" {}", self.text)).style(style);
        frame.render_widget(status, area);
    }
}
