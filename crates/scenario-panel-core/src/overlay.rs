//! Popover and tooltip bookkeeping. Neither carries scenario state.

use std::time::{Duration, Instant};

pub const DEFAULT_TOOLTIP_DISMISS_DELAY: Duration = Duration::from_millis(300);

/// At most one popover/menu is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlaySlot {
    active: Option<String>,
}

impl OverlaySlot {
    /// Opening an overlay replaces whatever was open. Opening the one that is
    /// already active closes it.
    pub fn toggle(&mut self, id: &str) -> Option<&str> {
        if self.active.as_deref() == Some(id) {
            self.active = None;
        } else {
            self.active = Some(id.to_string());
        }
        self.active.as_deref()
    }

    pub fn close(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// A click landed outside of `inside` (the overlay it hit, if any).
    pub fn outside_click(&mut self, inside: Option<&str>) -> bool {
        if self.active.is_none() || self.active.as_deref() == inside {
            return false;
        }
        self.close()
    }

    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

/// Coalesces hover-out events so a tooltip does not flicker when the pointer
/// briefly leaves and re-enters.
#[derive(Debug, Clone)]
pub struct TooltipDebounce {
    delay: Duration,
    visible: Option<String>,
    dismiss_due_at: Option<Instant>,
}

impl Default for TooltipDebounce {
    fn default() -> Self {
        Self::new(DEFAULT_TOOLTIP_DISMISS_DELAY)
    }
}

impl TooltipDebounce {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            visible: None,
            dismiss_due_at: None,
        }
    }

    pub fn hover(&mut self, target: &str) {
        self.visible = Some(target.to_string());
        self.dismiss_due_at = None;
    }

    pub fn leave(&mut self, now: Instant) {
        if self.visible.is_some() {
            self.dismiss_due_at = Some(now + self.delay);
        }
    }

    /// Returns `true` when the tooltip was dismissed by this tick.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.dismiss_due_at {
            Some(due_at) if now >= due_at => {
                self.visible = None;
                self.dismiss_due_at = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn visible(&self) -> Option<&str> {
        self.visible.as_deref()
    }
}
