//! The ordered frame store.
//!
//! [`FrameStore`] is the unit of reordering and removal. Every index-based
//! operation treats out-of-range indices as a silent no-op rather than an
//! error, so stale indices coming from a UI never panic.

use std::slice::Iter;

use crate::frame::Frame;

/// Ordered, mutable list of decoded frames.
///
/// The first frame's dimensions are the canonical output size of every
/// export; later frames are stretched to match.
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
    revision: u64,
}

impl FrameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame at the end.
    pub fn append(&mut self, frame: Frame) {
        self.frames.push(frame);
        self.touch();
    }

    /// Remove the frame at `index`, shifting later frames down by one.
    ///
    /// Returns `None` (and leaves the store untouched) if `index` is out of
    /// bounds.
    pub fn remove_at(&mut self, index: usize) -> Option<Frame> {
        if index >= self.frames.len() {
            log::debug!("Ignoring removal of frame {index} (store has {})", self.len());
            return None;
        }
        let frame = self.frames.remove(index);
        self.touch();
        Some(frame)
    }

    /// Move the frame at `from` so that it ends up at index `to`.
    ///
    /// The frame is removed first and then inserted at `to` in the shortened
    /// sequence, so moving index 0 to index 2 in `[A, B, C]` yields
    /// `[B, C, A]`. Returns `false` without mutating if `from == to` or
    /// either index is out of bounds.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        let len = self.frames.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let frame = self.frames.remove(from);
        self.frames.insert(to, frame);
        self.touch();
        true
    }

    /// Remove every frame.
    pub fn clear(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        self.frames.clear();
        self.touch();
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the store holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Iterate over frames in order.
    pub fn iter(&self) -> Iter<'_, Frame> {
        self.frames.iter()
    }

    /// All frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Output size every export renders at: the first frame's dimensions.
    pub fn canonical_size(&self) -> Option<(u32, u32)> {
        self.frames
            .first()
            .map(|frame| (frame.width(), frame.height()))
    }

    /// Copy of the current order. Frames share their pixel buffers, so this
    /// is cheap.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    /// Counter bumped by every mutation. Listings re-render when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl<'a> IntoIterator for &'a FrameStore {
    type Item = &'a Frame;
    type IntoIter = Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl Extend<Frame> for FrameStore {
    fn extend<T: IntoIterator<Item = Frame>>(&mut self, iter: T) {
        let before = self.frames.len();
        self.frames.extend(iter);
        if self.frames.len() != before {
            self.touch();
        }
    }
}
