// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Readiness Events
//!
//! Bit mask over read/write/error readiness conditions, and the tracker
//! that decides when the registered interest actually has to change.

use std::fmt;
use std::ops::BitOr;

/// Set of readiness conditions for a descriptor.
///
/// The bit values match common readiness-multiplexing layouts (epoll) so
/// they can be handed to OS-level polling primitives unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSet(u32);

impl EventSet {
    /// Readable condition.
    pub const READ: EventSet = EventSet(0x0001);
    /// Writable condition.
    pub const WRITE: EventSet = EventSet(0x0004);
    /// Error condition.
    pub const ERROR: EventSet = EventSet(0x0008);
    /// Interest asserted whenever the socket is open.
    pub const BASE: EventSet = EventSet(0x0001 | 0x0008);

    /// The empty set.
    pub const fn empty() -> Self {
        EventSet(0)
    }

    /// Raw bit value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Rebuild from a raw bit value.
    pub const fn from_bits(bits: u32) -> Self {
        EventSet(bits)
    }

    /// True if every bit of `other` is set in `self`.
    pub const fn contains(self, other: EventSet) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventSet {
    type Output = EventSet;

    fn bitor(self, rhs: EventSet) -> EventSet {
        EventSet(self.0 | rhs.0)
    }
}

impl fmt::Display for EventSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(EventSet::READ) {
            names.push("READ");
        }
        if self.contains(EventSet::WRITE) {
            names.push("WRITE");
        }
        if self.contains(EventSet::ERROR) {
            names.push("ERROR");
        }
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

/// Which way the next TLS negotiation step needs the socket to be ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Single source of truth for the interest mask registered with the
/// reactor.
///
/// The mask is recomputed from queue occupancy rather than mutated at
/// call sites, and a new value is reported only when it differs from the
/// last one handed out, so redundant reactor re-registrations are never
/// issued.
#[derive(Debug)]
pub struct InterestTracker {
    current: EventSet,
}

impl Default for InterestTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InterestTracker {
    /// Create a tracker at the base interest (READ|ERROR).
    pub fn new() -> Self {
        InterestTracker {
            current: EventSet::BASE,
        }
    }

    /// The mask as last handed out.
    pub fn current(&self) -> EventSet {
        self.current
    }

    /// Recompute the mask from queue occupancy.
    ///
    /// READ|ERROR stay asserted; WRITE is asserted iff the outbound queue
    /// is non-empty. Returns the new mask only when it changed.
    pub fn recompute(&mut self, queue_non_empty: bool) -> Option<EventSet> {
        let next = if queue_non_empty {
            EventSet::BASE | EventSet::WRITE
        } else {
            EventSet::BASE
        };
        self.transition(next)
    }

    /// Apply a TLS negotiation hint.
    ///
    /// A read hint wants the base mask; a write hint additionally asserts
    /// WRITE so buffered TLS records get flushed. READ|ERROR are never
    /// dropped.
    pub fn apply_hint(&mut self, direction: Direction) -> Option<EventSet> {
        let next = match direction {
            Direction::Read => EventSet::BASE,
            Direction::Write => EventSet::BASE | EventSet::WRITE,
        };
        self.transition(next)
    }

    /// Reset to the base interest for a fresh connection.
    pub fn reset(&mut self) {
        self.current = EventSet::BASE;
    }

    fn transition(&mut self, next: EventSet) -> Option<EventSet> {
        if next != self.current {
            self.current = next;
            Some(next)
        } else {
            None
        }
    }
}
