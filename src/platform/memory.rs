use super::{ConfirmDialog, EventModel, Listener, ListenerId, UnloadEvent, UnloadTarget};
use crate::guard::error::GuardResult;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Subscription bookkeeping call recorded by [`MemoryWindow`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCall {
    Subscribe { event: String, listener: ListenerId },
    Unsubscribe { event: String, listener: ListenerId },
}

/// Result of dispatching one unload notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Event after every listener ran
    pub event: UnloadEvent,
    /// Return value of each listener, in subscription order
    pub returned: Vec<Option<String>>,
}

impl DispatchOutcome {
    /// Text the platform would show: the event slot, else the last returned message
    pub fn warning(&self) -> Option<&str> {
        self.event
            .return_value
            .as_deref()
            .or_else(|| self.returned.iter().rev().flatten().next().map(String::as_str))
    }
}

/// In-memory window
///
/// Keeps listeners in subscription order and records every
/// subscribe/unsubscribe call, so tests and the simulator can observe the
/// registration lifecycle.
#[derive(Debug, Default)]
pub struct MemoryWindow {
    model: EventModel,
    listeners: RefCell<Vec<(String, Listener)>>,
    calls: RefCell<Vec<TargetCall>>,
}

impl MemoryWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window that only understands the legacy attach model
    pub fn legacy() -> Self {
        Self {
            model: EventModel::Legacy,
            ..Self::default()
        }
    }

    /// Number of active subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether `listener` is currently subscribed
    pub fn is_subscribed(&self, listener: ListenerId) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|(_, l)| l.id() == listener)
    }

    /// Every subscribe/unsubscribe call so far, oldest first
    pub fn calls(&self) -> Vec<TargetCall> {
        self.calls.borrow().clone()
    }

    /// Fire the unload notification.
    ///
    /// Listeners run over a snapshot, so a listener may unsubscribe itself.
    /// The first listener failure aborts the dispatch and is returned.
    pub fn dispatch_unload(&self) -> GuardResult<DispatchOutcome> {
        let name = self.model.event_name();
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::debug!("Dispatching {} to {} listener(s)", name, snapshot.len());

        let mut event = UnloadEvent::new(self.model);
        let mut returned = Vec::with_capacity(snapshot.len());
        for listener in snapshot {
            returned.push(listener.call(&mut event)?);
        }

        Ok(DispatchOutcome { event, returned })
    }
}

impl UnloadTarget for MemoryWindow {
    fn event_model(&self) -> EventModel {
        self.model
    }

    fn add_listener(&self, event_name: &str, listener: Listener) {
        self.calls.borrow_mut().push(TargetCall::Subscribe {
            event: event_name.to_string(),
            listener: listener.id(),
        });
        self.listeners
            .borrow_mut()
            .push((event_name.to_string(), listener));
    }

    fn remove_listener(&self, event_name: &str, listener: &Listener) {
        self.calls.borrow_mut().push(TargetCall::Unsubscribe {
            event: event_name.to_string(),
            listener: listener.id(),
        });
        self.listeners
            .borrow_mut()
            .retain(|(event, l)| !(event == event_name && l == listener));
    }
}

/// Dialog answering from a queue of scripted replies
///
/// Once the queue is empty every prompt gets the fallback answer.
#[derive(Debug)]
pub struct ScriptedDialog {
    answers: RefCell<VecDeque<bool>>,
    fallback: bool,
    prompts: RefCell<Vec<String>>,
    shown: Cell<usize>,
}

impl ScriptedDialog {
    /// Dialog that always answers `answer`
    pub fn always(answer: bool) -> Self {
        Self::with_answers([], answer)
    }

    pub fn with_answers(answers: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            fallback,
            prompts: RefCell::new(Vec::new()),
            shown: Cell::new(0),
        }
    }

    /// Messages shown so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn times_shown(&self) -> usize {
        self.shown.get()
    }
}

impl ConfirmDialog for ScriptedDialog {
    fn confirm(&self, message: &str) -> bool {
        self.prompts.borrow_mut().push(message.to_string());
        self.shown.set(self.shown.get() + 1);
        self.answers.borrow_mut().pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_and_remove_are_recorded() {
        let window = MemoryWindow::new();
        let listener = Listener::new(|_| Ok(None));

        window.add_listener("beforeunload", listener.clone());
        assert_eq!(window.listener_count(), 1);
        assert!(window.is_subscribed(listener.id()));

        window.remove_listener("beforeunload", &listener);
        assert_eq!(window.listener_count(), 0);
        assert_eq!(
            window.calls(),
            vec![
                TargetCall::Subscribe {
                    event: "beforeunload".to_string(),
                    listener: listener.id()
                },
                TargetCall::Unsubscribe {
                    event: "beforeunload".to_string(),
                    listener: listener.id()
                },
            ]
        );
    }

    #[test]
    fn test_remove_is_keyed_by_event_name() {
        let window = MemoryWindow::new();
        let listener = Listener::new(|_| Ok(None));

        window.add_listener("beforeunload", listener.clone());
        window.remove_listener("onbeforeunload", &listener);
        assert_eq!(window.listener_count(), 1);
    }

    #[test]
    fn test_dispatch_collects_return_values() {
        let window = MemoryWindow::new();
        window.add_listener("beforeunload", Listener::new(|_| Ok(None)));
        window.add_listener(
            "beforeunload",
            Listener::new(|event| {
                event.return_value = Some("Unsaved".to_string());
                Ok(Some("Unsaved".to_string()))
            }),
        );

        let outcome = window.dispatch_unload().unwrap();
        assert_eq!(outcome.returned, vec![None, Some("Unsaved".to_string())]);
        assert_eq!(outcome.warning(), Some("Unsaved"));
        assert_eq!(outcome.event.event_type, "beforeunload");
    }

    #[test]
    fn test_dispatch_ignores_other_event_names() {
        let window = MemoryWindow::legacy();
        window.add_listener("beforeunload", Listener::new(|_| Ok(Some("x".into()))));

        let outcome = window.dispatch_unload().unwrap();
        assert!(outcome.returned.is_empty());
        assert_eq!(outcome.warning(), None);
        assert_eq!(outcome.event.event_type, "onbeforeunload");
    }

    #[test]
    fn test_scripted_dialog_answers_in_order() {
        let dialog = ScriptedDialog::with_answers([true, false], true);
        assert!(dialog.confirm("first"));
        assert!(!dialog.confirm("second"));
        assert!(dialog.confirm("third"));
        assert_eq!(dialog.times_shown(), 3);
        assert_eq!(dialog.prompts(), vec!["first", "second", "third"]);
    }
}
