/// Before-unload guard
///
/// Holds a default message and an ordered list of blocking conditions, and
/// couples two capabilities:
///
/// - Unload interception: a listener subscribed to the host's unload
///   notification writes the warning text into the event when blocked
/// - Confirmation gate: `confirmed_if_necessary` asks the user before running
///   an action while any condition blocks
///
/// # Usage
///
/// ```rust,ignore
/// use unload_guard::guard::{Condition, Guard};
///
/// let guard = Guard::builder("You have unsaved changes.")
///     .conditions(Condition::new(move || editor.is_dirty()))
///     .build(host)?;
///
/// continue_button.on_click(|| {
///     guard.confirmed_if_necessary(|| navigate("/next"), false)
/// });
/// ```

pub mod condition;
pub mod error;

pub use condition::{Condition, ConditionId, Conditions, Verdict};
pub use error::{GuardError, GuardResult};

use crate::platform::{EventModel, HostBindings, Listener, ListenerId, UnloadEvent, UnloadTarget};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// What `register` does when the guard is already subscribed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterPolicy {
    /// Remove the active subscription, then subscribe again
    #[default]
    UnregisterFirst,
    /// Overwrite the stored reference; the old subscription stays on its target
    Replace,
    /// Fail with `AlreadyRegistered`
    Reject,
}

impl RegisterPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unregister_first" | "unregister-first" => Some(Self::UnregisterFirst),
            "replace" => Some(Self::Replace),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UnregisterFirst => "unregister_first",
            Self::Replace => "replace",
            Self::Reject => "reject",
        }
    }
}

/// State shared with the subscribed listener
struct GuardState {
    message: String,
    conditions: RefCell<Vec<Condition>>,
}

impl GuardState {
    fn check(&self) -> GuardResult<Verdict> {
        // Snapshot so predicates may edit the list while we iterate
        let conditions = self.conditions.borrow().clone();

        for (index, condition) in conditions.iter().enumerate() {
            let verdict = condition
                .evaluate()
                .map_err(|source| GuardError::condition(index, source))?
                .normalized();
            if verdict.is_blocking() {
                tracing::trace!("Condition #{} blocks: {:?}", index, verdict);
                return Ok(verdict);
            }
        }

        Ok(Verdict::Clear)
    }

    fn handle(&self, event: &mut UnloadEvent) -> GuardResult<Option<String>> {
        let verdict = self.check()?;

        match verdict.resolve(&self.message) {
            Some(message) => {
                // Platforms disagree on the channel: fill the slot and return it
                let message = message.to_string();
                event.return_value = Some(message.clone());
                tracing::info!("Unload blocked: {}", message);
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }
}

/// Active subscription: the listener plus where and under which name it lives
struct Registration {
    target: Rc<dyn UnloadTarget>,
    event_name: &'static str,
    listener: Listener,
}

/// Guard coordinating conditions, the unload subscription and the confirmation gate
///
/// Dropping a guard does not unregister it. Call [`Guard::unregister`] first;
/// a listener left on its target after the drop answers "no opinion".
pub struct Guard {
    state: Rc<GuardState>,
    host: HostBindings,
    handler_reference: RefCell<Option<Registration>>,
    policy: RegisterPolicy,
    event_model: Option<EventModel>,
}

impl Guard {
    /// Start building a guard with its default message
    pub fn builder(message: impl Into<String>) -> GuardBuilder {
        GuardBuilder::new(message)
    }

    /// Build with default options, subscribing on the host window
    pub fn new(
        message: impl Into<String>,
        conditions: impl Into<Conditions>,
        host: HostBindings,
    ) -> GuardResult<Self> {
        Self::builder(message).conditions(conditions).build(host)
    }

    /// Default message
    pub fn message(&self) -> &str {
        &self.state.message
    }

    pub fn register_policy(&self) -> RegisterPolicy {
        self.policy
    }

    /// Evaluate conditions in order; the first blocking verdict wins.
    pub fn check(&self) -> GuardResult<Verdict> {
        self.state.check()
    }

    /// Unload handler.
    ///
    /// Returns `None` and leaves `event` untouched when nothing blocks.
    /// Otherwise writes the resolved message into `event.return_value` and
    /// returns it too.
    pub fn handler(&self, event: &mut UnloadEvent) -> GuardResult<Option<String>> {
        self.state.handle(event)
    }

    /// Fresh listener bound to this guard's handler
    pub fn listener(&self) -> Listener {
        let state: Weak<GuardState> = Rc::downgrade(&self.state);
        Listener::new(move |event| match state.upgrade() {
            Some(state) => state.handle(event),
            None => {
                tracing::warn!("Unload listener outlived its guard; ignoring event");
                Ok(None)
            }
        })
    }

    /// Subscribe to the unload notification on the host window
    pub fn register(&self) -> GuardResult<()> {
        let window = Rc::clone(&self.host.window);
        self.register_on(&window, None)
    }

    /// Subscribe `handler` (default: this guard's own listener) on `target`.
    ///
    /// A second call while registered follows the guard's [`RegisterPolicy`].
    pub fn register_on(
        &self,
        target: &Rc<dyn UnloadTarget>,
        handler: Option<Listener>,
    ) -> GuardResult<()> {
        if self.is_registered() {
            match self.policy {
                RegisterPolicy::Reject => return Err(GuardError::AlreadyRegistered),
                RegisterPolicy::UnregisterFirst => self.unregister(),
                RegisterPolicy::Replace => {
                    tracing::warn!(
                        "Replacing unload handler reference; previous subscription stays active"
                    );
                }
            }
        }

        let listener = handler.unwrap_or_else(|| self.listener());
        let event_name = self
            .event_model
            .unwrap_or_else(|| target.event_model())
            .event_name();

        target.add_listener(event_name, listener.clone());
        tracing::debug!("Registered unload listener {} on '{}'", listener.id(), event_name);

        *self.handler_reference.borrow_mut() = Some(Registration {
            target: Rc::clone(target),
            event_name,
            listener,
        });
        Ok(())
    }

    /// Unsubscribe from the target the guard registered on.
    ///
    /// No-op when not registered; safe to call any number of times.
    pub fn unregister(&self) {
        let Some(registration) = self.handler_reference.borrow_mut().take() else {
            tracing::trace!("Unregister skipped: no active subscription");
            return;
        };
        registration
            .target
            .remove_listener(registration.event_name, &registration.listener);
        tracing::debug!(
            "Unregistered unload listener {} from '{}'",
            registration.listener.id(),
            registration.event_name
        );
    }

    /// Unsubscribe the stored listener from an explicit `target`.
    ///
    /// Same no-op rule as [`Guard::unregister`]. A `target` other than the one
    /// the guard registered on is left alone and the subscription is kept.
    pub fn unregister_from(&self, target: &Rc<dyn UnloadTarget>) {
        let mut reference = self.handler_reference.borrow_mut();
        let Some(registration) = reference.as_ref() else {
            tracing::trace!("Unregister skipped: no active subscription");
            return;
        };
        if !Rc::ptr_eq(&registration.target, target) {
            tracing::warn!(
                "Unregister skipped: listener {} is not subscribed on this target",
                registration.listener.id()
            );
            return;
        }

        let Some(registration) = reference.take() else {
            return;
        };
        drop(reference);
        target.remove_listener(registration.event_name, &registration.listener);
        tracing::debug!(
            "Unregistered unload listener {} from '{}'",
            registration.listener.id(),
            registration.event_name
        );
    }

    pub fn is_registered(&self) -> bool {
        self.handler_reference.borrow().is_some()
    }

    /// Identity of the subscribed listener, if any
    pub fn handler_reference(&self) -> Option<ListenerId> {
        self.handler_reference
            .borrow()
            .as_ref()
            .map(|registration| registration.listener.id())
    }

    /// Run `action`, asking the user first if any condition blocks.
    ///
    /// Returns `Some(result)` when the action ran and `None` when the user
    /// declined. On acceptance the guard unregisters before the action starts
    /// unless `preserve_handlers` is set, so an action that navigates away is
    /// not intercepted again. Conditions are evaluated once, before the prompt.
    pub fn confirmed_if_necessary<F, R>(
        &self,
        action: F,
        preserve_handlers: bool,
    ) -> GuardResult<Option<R>>
    where
        F: FnOnce() -> R,
    {
        let verdict = self.check()?;

        let Some(message) = verdict.resolve(&self.state.message) else {
            tracing::debug!("Nothing blocks; running action without prompt");
            return Ok(Some(action()));
        };

        tracing::info!("Asking for confirmation: {}", message);
        if !self.host.dialog.confirm(message) {
            tracing::info!("Confirmation declined; action skipped");
            return Ok(None);
        }

        if !preserve_handlers {
            self.unregister();
        }

        tracing::debug!("Confirmation accepted; running action");
        Ok(Some(action()))
    }

    /// Append a condition; returns its id for later removal
    pub fn push_condition(&self, condition: Condition) -> ConditionId {
        let id = condition.id();
        self.state.conditions.borrow_mut().push(condition);
        id
    }

    /// Remove the condition with `id`; false when it is not present
    pub fn remove_condition(&self, id: ConditionId) -> bool {
        let mut conditions = self.state.conditions.borrow_mut();
        let before = conditions.len();
        conditions.retain(|condition| condition.id() != id);
        conditions.len() != before
    }

    pub fn clear_conditions(&self) {
        self.state.conditions.borrow_mut().clear();
    }

    pub fn condition_count(&self) -> usize {
        self.state.conditions.borrow().len()
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Some(id) = self.handler_reference() {
            tracing::warn!("Guard dropped while listener {} is still subscribed", id);
        }
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("message", &self.state.message)
            .field("conditions", &self.condition_count())
            .field("handler_reference", &self.handler_reference())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder validating construction parameters before any side effect
#[derive(Debug)]
pub struct GuardBuilder {
    message: String,
    conditions: Conditions,
    auto_register: bool,
    policy: RegisterPolicy,
    event_model: Option<EventModel>,
}

impl GuardBuilder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conditions: Conditions::None,
            auto_register: true,
            policy: RegisterPolicy::default(),
            event_model: None,
        }
    }

    /// Replace the default message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn conditions(mut self, conditions: impl Into<Conditions>) -> Self {
        self.conditions = conditions.into();
        self
    }

    /// Subscribe on the host window as the last construction step (default true)
    pub fn auto_register(mut self, auto_register: bool) -> Self {
        self.auto_register = auto_register;
        self
    }

    pub fn register_policy(mut self, policy: RegisterPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Force an event model instead of following each target's own
    pub fn event_model(mut self, model: EventModel) -> Self {
        self.event_model = Some(model);
        self
    }

    pub fn build(self, host: HostBindings) -> GuardResult<Guard> {
        if self.message.is_empty() {
            return Err(GuardError::invalid_message("an empty string"));
        }

        let guard = Guard {
            state: Rc::new(GuardState {
                message: self.message,
                conditions: RefCell::new(self.conditions.into_vec()),
            }),
            host,
            handler_reference: RefCell::new(None),
            policy: self.policy,
            event_model: self.event_model,
        };

        if self.auto_register {
            guard.register()?;
        }

        Ok(guard)
    }
}
