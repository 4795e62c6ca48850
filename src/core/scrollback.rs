//! Per-window line history.

use std::collections::VecDeque;

/// Ordered lines for one destination, oldest first.
///
/// `max_lines` bounds retention (oldest lines are evicted first); 0 keeps
/// every line.
#[derive(Debug, Clone, Default)]
pub struct Scrollback {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl Scrollback {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
        if self.max_lines > 0 {
            while self.lines.len() > self.max_lines {
                self.lines.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The last `min(len, height)` lines, in original order.
    pub fn visible_tail(&self, height: usize) -> impl Iterator<Item = &str> {
        let skip = self.lines.len().saturating_sub(height);
        self.lines.iter().skip(skip).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}
