//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! - `OutputSurface`: tail of the focused window's scrollback
//! - `StatusLine`: `"<window> - <connection>"` indicator
//!
//! ### Stateful Components (Event-Driven)
//!
//! - `InputLine`: single-line editor that emits `InputEvent`s
//!
//! Each component file holds its state, events, rendering and tests.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs             (this file)
//! ├── output_surface.rs  (scrollback tail)
//! ├── status_line.rs     (focused window label)
//! └── input_line/        (editor with horizontal scroll)
//! ```

pub mod input_line;
pub mod output_surface;
pub mod status_line;

pub use input_line::{InputEvent, InputLine};
pub use output_surface::OutputSurface;
pub use status_line::StatusLine;
