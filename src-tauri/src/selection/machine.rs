//! Rubber-band selection state machine.
//!
//! Driven by abstract pointer events so any event source (the webview
//! overlay, a test) produces the same transitions:
//!
//! ```text
//! Idle --down--> Dragging --move--> Dragging --up--> Resolved
//!   \               \
//!    `---cancel------`---cancel--> Canceled
//! ```

use super::fit::{DisplayRect, ScaleFit};
use crate::capture::Region;
use serde::Deserialize;

/// Smallest accepted selection, per axis, in source pixels.
pub const MIN_SELECTION_PX: u32 = 5;

/// Input to the selector, in overlay surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionState {
    Idle,
    Dragging {
        anchor: (f64, f64),
        rect: DisplayRect,
    },
    Resolved(Option<Region>),
    Canceled,
}

/// What the event did, for the surface to react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Nothing to redraw.
    Ignored,
    /// The selection rectangle moved; already clamped and normalized.
    Dragged(DisplayRect),
    /// Terminal state reached; tear the surface down.
    Finished(Option<Region>),
}

#[derive(Debug, Clone)]
pub struct SelectionMachine {
    fit: ScaleFit,
    state: SelectionState,
}

impl SelectionMachine {
    pub fn new(fit: ScaleFit) -> Self {
        Self {
            fit,
            state: SelectionState::Idle,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            SelectionState::Resolved(_) | SelectionState::Canceled
        )
    }

    pub fn handle(&mut self, event: PointerEvent) -> Transition {
        if self.is_finished() {
            return Transition::Ignored;
        }

        match (event, self.state) {
            (PointerEvent::Cancel, _) => {
                self.state = SelectionState::Canceled;
                Transition::Finished(None)
            }
            // A second press restarts the drag from the new point.
            (PointerEvent::Down { x, y }, _) => {
                let rect = self.fit.clamp_rect(x, y, x, y);
                self.state = SelectionState::Dragging {
                    anchor: (x, y),
                    rect,
                };
                Transition::Dragged(rect.normalized())
            }
            (PointerEvent::Move { x, y }, SelectionState::Dragging { anchor, .. }) => {
                let rect = self.fit.clamp_rect(anchor.0, anchor.1, x, y);
                self.state = SelectionState::Dragging { anchor, rect };
                Transition::Dragged(rect.normalized())
            }
            (PointerEvent::Up { x, y }, SelectionState::Dragging { anchor, .. }) => {
                let rect = self.fit.clamp_rect(anchor.0, anchor.1, x, y);
                let region = self.resolve(rect);
                self.state = SelectionState::Resolved(region);
                Transition::Finished(region)
            }
            (PointerEvent::Move { .. } | PointerEvent::Up { .. }, _) => Transition::Ignored,
        }
    }

    /// Maps a display rectangle to a source region, rejecting slivers.
    fn resolve(&self, rect: DisplayRect) -> Option<Region> {
        let rect = rect.normalized();
        let (left, top) = self.fit.to_source(rect.x0, rect.y0);
        let (right, bottom) = self.fit.to_source(rect.x1, rect.y1);
        let region = Region::new(left, top, right, bottom);

        if region.width() >= MIN_SELECTION_PX && region.height() >= MIN_SELECTION_PX {
            Some(region)
        } else {
            None
        }
    }
}
