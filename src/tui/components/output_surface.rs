//! # OutputSurface Component
//!
//! Draws the tail of one window's scrollback, oldest visible line at the
//! top. Lines wider than the area are clipped, not wrapped, so one stored
//! line is always one screen row.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::core::scrollback::Scrollback;
use crate::tui::component::Component;

pub struct OutputSurface<'a> {
    pub scrollback: &'a Scrollback,
}

impl<'a> OutputSurface<'a> {
    pub fn new(scrollback: &'a Scrollback) -> Self {
        Self { scrollback }
    }
}

impl Component for OutputSurface<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .scrollback
            .visible_tail(area.height as usize)
            .map(Line::raw)
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }
}
