//! Drag-and-drop reordering.
//!
//! [`DragSession`] is a small state machine over a single drag gesture:
//!
//! ```text
//! Idle ──start(i)──▶ Dragging { source: i }
//! Dragging ──enter(j)/leave(j)──▶ Dragging (highlight only)
//! Dragging ──drop_on(j ≠ i)──▶ Idle   (store.move_to(i, j))
//! Dragging ──drop_on(i) / end()──▶ Idle   (no mutation)
//! ```
//!
//! # Example
//!
//! ```
//! use flipbook::{DragSession, DropOutcome, FrameStore};
//!
//! let mut store = FrameStore::new();
//! let mut drag = DragSession::new();
//!
//! drag.start(0);
//! // Nothing to move in an empty store.
//! assert_eq!(drag.drop_on(2, &mut store), DropOutcome::Ignored);
//! assert!(!drag.is_dragging());
//! ```

use crate::store::FrameStore;

/// Current phase of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A frame is being dragged.
    Dragging {
        /// Index of the dragged frame when the drag started.
        source: usize,
        /// Frame currently highlighted as a drop target.
        hover: Option<usize>,
    },
}

/// Result of a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The frame at `from` was moved to `to`.
    Moved {
        /// Original index of the dragged frame.
        from: usize,
        /// Index the frame now occupies.
        to: usize,
    },
    /// The drop did not change the store.
    Ignored,
}

/// A single drag-and-drop session over a [`FrameStore`].
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Returns `true` while a frame is being dragged.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Index of the highlighted drop target, if any.
    pub fn hover(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { hover, .. } => hover,
            DragState::Idle => None,
        }
    }

    /// Begin dragging the frame at `index`.
    ///
    /// A gesture already in progress is discarded.
    pub fn start(&mut self, index: usize) {
        if let DragState::Dragging { source, .. } = self.state {
            log::debug!("Discarding unfinished drag of frame {source}");
        }
        self.state = DragState::Dragging {
            source: index,
            hover: None,
        };
    }

    /// The pointer entered the frame at `index`. Highlights it unless it is
    /// the dragged frame itself.
    pub fn enter(&mut self, index: usize) {
        if let DragState::Dragging { source, hover } = &mut self.state {
            if index != *source {
                *hover = Some(index);
            }
        }
    }

    /// The pointer left the frame at `index`.
    pub fn leave(&mut self, index: usize) {
        if let DragState::Dragging { hover, .. } = &mut self.state {
            if *hover == Some(index) {
                *hover = None;
            }
        }
    }

    /// Drop onto the frame at `target`, committing the move when it differs
    /// from the dragged frame. The session is idle afterwards either way.
    pub fn drop_on(&mut self, target: usize, store: &mut FrameStore) -> DropOutcome {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging { source, .. } = state else {
            return DropOutcome::Ignored;
        };
        if target == source {
            return DropOutcome::Ignored;
        }
        if store.move_to(source, target) {
            log::debug!("Moved frame {source} to {target}");
            DropOutcome::Moved {
                from: source,
                to: target,
            }
        } else {
            DropOutcome::Ignored
        }
    }

    /// The gesture ended without a drop. Discards the session.
    pub fn end(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_on_source_does_not_highlight() {
        let mut drag = DragSession::new();
        drag.start(1);
        drag.enter(1);
        assert_eq!(drag.hover(), None);
        drag.enter(2);
        assert_eq!(drag.hover(), Some(2));
        drag.leave(3);
        assert_eq!(drag.hover(), Some(2));
        drag.leave(2);
        assert_eq!(drag.hover(), None);
    }

    #[test]
    fn enter_while_idle_is_ignored() {
        let mut drag = DragSession::new();
        drag.enter(0);
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn end_discards_session() {
        let mut drag = DragSession::new();
        drag.start(0);
        drag.enter(1);
        drag.end();
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.hover(), None);
    }
}
