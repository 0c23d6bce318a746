/// Host platform boundary
///
/// The guard never touches a real browser. Everything it needs from the
/// outside world is reached through the traits in this module and handed to
/// it as a [`HostBindings`] capability object:
///
/// - [`UnloadTarget`]: subscribe/unsubscribe to the "about to unload" notification
/// - [`ConfirmDialog`]: blocking yes/no prompt
/// - [`UnloadEvent`]: the event handed to listeners, with its writable warning slot
///
/// # Adapters
///
/// - memory: in-memory window and scripted dialog (tests, simulator)
/// - terminal: yes/no prompt on a reader/writer pair

pub mod events;
pub mod memory;
pub mod terminal;

pub use events::{EventModel, UnloadEvent};

use crate::guard::error::GuardResult;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Identity of a subscribed listener.
///
/// Plays the role of the callback reference: subscribe and unsubscribe are
/// keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type Callback = dyn Fn(&mut UnloadEvent) -> GuardResult<Option<String>>;

/// Unload callback handle. Clones share the callback and the identity.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    callback: Rc<Callback>,
}

impl Listener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut UnloadEvent) -> GuardResult<Option<String>> + 'static,
    {
        Self {
            id: ListenerId(Uuid::new_v4()),
            callback: Rc::new(callback),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the callback. `Some(message)` asks the platform to warn the user.
    pub fn call(&self, event: &mut UnloadEvent) -> GuardResult<Option<String>> {
        (self.callback)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

/// Object that delivers the unload notification (the window, in a browser)
pub trait UnloadTarget {
    /// Subscription style the target understands
    fn event_model(&self) -> EventModel {
        EventModel::Standard
    }

    /// Subscribe `listener` under `event_name`
    fn add_listener(&self, event_name: &str, listener: Listener);

    /// Remove the subscription keyed by `listener`'s identity
    fn remove_listener(&self, event_name: &str, listener: &Listener);
}

/// Blocking, synchronous yes/no dialog
pub trait ConfirmDialog {
    /// Show `message`; returns true when the user accepts
    fn confirm(&self, message: &str) -> bool;
}

/// Capabilities injected into a guard
#[derive(Clone)]
pub struct HostBindings {
    /// Default target for `register`/`unregister`
    pub window: Rc<dyn UnloadTarget>,
    /// Dialog used by the confirmation gate
    pub dialog: Rc<dyn ConfirmDialog>,
}

impl HostBindings {
    pub fn new(window: Rc<dyn UnloadTarget>, dialog: Rc<dyn ConfirmDialog>) -> Self {
        Self { window, dialog }
    }
}

impl fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBindings")
            .field("event_model", &self.window.event_model())
            .finish_non_exhaustive()
    }
}
