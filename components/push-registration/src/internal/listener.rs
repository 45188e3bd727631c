/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Push state observers.
//!
//! Listeners are held in an ordered registry owned by the manager. They are
//! called on a thread that changed the confirmed state, so a listener that
//! needs to touch UI state should hand the event over to the UI context
//! itself; [`ChannelListener`] does exactly that through a channel.
//!
//! Events are delivered in the order the state changed, even when several
//! threads change it: see [`Notifier`].

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    mpsc::{channel, Receiver, Sender},
    Arc,
};

use parking_lot::Mutex;

use crate::error::{debug, error};

/// The confirmed enabled state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChangeEvent {
    pub push_enabled: bool,
}

pub trait PushStateListener: Send + Sync {
    fn on_push_state_change(&self, event: StateChangeEvent);
}

/// Identifies a subscribed listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<(ListenerHandle, Arc<dyn PushStateListener>)>,
    next_handle: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn PushStateListener>) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        self.listeners.push((handle, listener));
        handle
    }

    /// Returns false if `handle` was not subscribed.
    pub fn unsubscribe(&mut self, handle: ListenerHandle) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(h, _)| *h != handle);
        self.listeners.len() != before
    }

    /// The current listeners in subscription order.
    pub fn snapshot(&self) -> Vec<Arc<dyn PushStateListener>> {
        self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

/// Deliver `event` to each listener in turn. A panicking listener is logged
/// and skipped; it never reaches the caller.
pub fn deliver(listeners: &[Arc<dyn PushStateListener>], event: StateChangeEvent) {
    debug!(
        "PushStateListener: State changed to : {}",
        if event.push_enabled {
            "PUSH ENABLED"
        } else {
            "PUSH DISABLED"
        }
    );
    for listener in listeners {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            listener.on_push_state_change(event);
        }));
        if result.is_err() {
            error!("PushStateListener:onPushStateChange Failed");
        }
    }
}

#[derive(Default)]
struct PendingEvents {
    events: VecDeque<StateChangeEvent>,
    delivering: bool,
}

/// Queues state changes and delivers them one at a time, in order.
///
/// Callers [`enqueue`](Self::enqueue) while still holding the lock that
/// ordered the state change, then [`flush`](Self::flush) once that lock is
/// released. Only one thread delivers at a time: a thread that finds delivery
/// in progress leaves its events to the delivering thread. This also lets a
/// listener call back into the manager without deadlocking; the events its
/// call produces are delivered after the current one.
#[derive(Default)]
pub struct Notifier {
    listeners: Mutex<ListenerRegistry>,
    pending: Mutex<PendingEvents>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn PushStateListener>) -> ListenerHandle {
        self.listeners.lock().subscribe(listener)
    }

    pub fn unsubscribe(&self, handle: ListenerHandle) -> bool {
        self.listeners.lock().unsubscribe(handle)
    }

    pub fn enqueue(&self, event: StateChangeEvent) {
        self.pending.lock().events.push_back(event);
    }

    pub fn flush(&self) {
        {
            let mut pending = self.pending.lock();
            if pending.delivering {
                return;
            }
            pending.delivering = true;
        }
        loop {
            let event = {
                let mut pending = self.pending.lock();
                match pending.events.pop_front() {
                    Some(event) => event,
                    None => {
                        pending.delivering = false;
                        return;
                    }
                }
            };
            // Listeners added or removed by an earlier event apply to this one.
            let snapshot = self.listeners.lock().snapshot();
            deliver(&snapshot, event);
        }
    }
}

/// Forwards events into a channel the caller drains on its own context.
pub struct ChannelListener {
    sender: Mutex<Sender<StateChangeEvent>>,
}

impl ChannelListener {
    pub fn new() -> (Self, Receiver<StateChangeEvent>) {
        let (sender, receiver) = channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl PushStateListener for ChannelListener {
    fn on_push_state_change(&self, event: StateChangeEvent) {
        // The receiver going away just means nobody is interested any more.
        if self.sender.lock().send(event).is_err() {
            debug!("state change receiver dropped");
        }
    }
}
