use std::collections::VecDeque;

use crate::protocol::{Frame, FrameFilter};

/// Frames received but not yet claimed by any receive call, in arrival order.
#[derive(Debug, Default)]
pub(crate) struct PendingFrameQueue {
    frames: VecDeque<Frame>,
}

impl PendingFrameQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Remove and return the oldest frame accepted by `filter`.
    pub(crate) fn offer(&mut self, filter: &FrameFilter) -> Option<Frame> {
        let index = self.frames.iter().position(|frame| filter.matches(frame))?;
        self.frames.remove(index)
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    pub(crate) fn push_front(&mut self, frame: Frame) {
        self.frames.push_front(frame);
    }

    /// Empty the queue, oldest frame first.
    pub(crate) fn drain(&mut self) -> Vec<Frame> {
        self.frames.drain(..).collect()
    }

    #[cfg(feature = "tracing")]
    pub(crate) fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
