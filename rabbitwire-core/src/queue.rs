// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Outbound Frame Queue
//!
//! FIFO of opaque byte frames awaiting transmission. A partially sent
//! frame's unsent suffix goes back to the front, never the back, so later
//! frames can never overtake it.

use std::collections::VecDeque;

/// Ordered queue of outbound byte frames.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    frames: VecDeque<Vec<u8>>,
}

impl OutboundQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame at the back.
    pub fn enqueue(&mut self, frame: Vec<u8>) {
        self.frames.push_back(frame);
    }

    /// Take the frame at the front.
    pub fn pop_front(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// Reinsert a frame (or the unsent suffix of one) at the front.
    pub fn requeue_front(&mut self, frame: Vec<u8>) {
        self.frames.push_front(frame);
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Total queued bytes, for diagnostics.
    pub fn pending_bytes(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    /// Iterate the queued frames front to back.
    pub fn frames(&self) -> impl Iterator<Item = &[u8]> {
        self.frames.iter().map(Vec::as_slice)
    }

    /// Drop all queued frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
