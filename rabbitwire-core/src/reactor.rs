// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reactor Interface
//!
//! The readiness-notification event loop this transport plugs into. The
//! loop itself lives elsewhere; the transport only registers interest,
//! schedules timers and asks the loop to stop.

use std::os::fd::RawFd;
use std::time::Duration;

use crate::events::EventSet;

/// Opaque token for a scheduled timer.
///
/// Owned by whoever scheduled the timer; passed back verbatim to cancel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Readiness-notification event loop consumed by the transport.
///
/// All calls happen on the reactor's own thread of control; implementations
/// do not need to be thread-safe beyond that.
pub trait Reactor {
    /// Register a descriptor for the first time under the given mask.
    fn register_initial(&mut self, fd: RawFd, mask: EventSet);

    /// Replace the interest mask for an already registered descriptor.
    fn update_interest(&mut self, fd: RawFd, mask: EventSet);

    /// Drop a descriptor's registration.
    fn unregister(&mut self, fd: RawFd);

    /// Schedule `callback` to fire after `deadline`.
    fn add_timer(&mut self, deadline: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle;

    /// Cancel a previously scheduled timer.
    fn cancel_timer(&mut self, handle: TimerHandle);

    /// Stop the event loop.
    fn stop(&mut self);
}
