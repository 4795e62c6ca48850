//! # Display State
//!
//! Everything a render pass reads lives in one [`Display`] behind one mutex:
//! the window registry (including focus) and the view that draws it.
//!
//! Two tasks take the lock: the event router (new lines, focus changes) and
//! the keyboard task (input line edits). Each holds it for one mutation plus
//! at most one render pass, so renders never interleave.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::core::destination::{DestinationKey, DestinationRegistry};

/// Something that can draw the focused window.
pub trait View: Send {
    /// Clears, draws the focused window plus chrome, and flushes once.
    fn render(&mut self, registry: &DestinationRegistry) -> io::Result<()>;

    /// Called whenever focus moves, so labels can follow it.
    fn focus_changed(&mut self, key: &DestinationKey);
}

pub struct Display<V> {
    pub registry: DestinationRegistry,
    pub view: V,
}

pub type SharedDisplay<V> = Arc<Mutex<Display<V>>>;

impl<V: View> Display<V> {
    pub fn new(registry: DestinationRegistry, mut view: V) -> Self {
        view.focus_changed(registry.focused_key());
        Self { registry, view }
    }

    pub fn shared(registry: DestinationRegistry, view: V) -> SharedDisplay<V> {
        Arc::new(Mutex::new(Self::new(registry, view)))
    }

    /// Runs one render pass. Failures are logged and dropped.
    pub fn render(&mut self) {
        if let Err(e) = self.view.render(&self.registry) {
            warn!("Render failed: {}", e);
        }
    }

    /// Focuses an existing window and tells the view. Returns false if the
    /// window does not exist.
    pub fn focus(&mut self, key: &DestinationKey) -> bool {
        if !self.registry.focus(key) {
            return false;
        }
        self.view.focus_changed(key);
        true
    }

    pub fn focus_next(&mut self) {
        let key = self.registry.focus_next().clone();
        self.view.focus_changed(&key);
    }

    pub fn focus_prev(&mut self) {
        let key = self.registry.focus_prev().clone();
        self.view.focus_changed(&key);
    }
}

/// Locks the display, recovering from a poisoned lock.
pub fn lock_display<V>(display: &SharedDisplay<V>) -> MutexGuard<'_, Display<V>> {
    display.lock().unwrap_or_else(PoisonError::into_inner)
}
