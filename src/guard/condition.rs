use crate::guard::error::BoxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Outcome of evaluating a blocking condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "message", rename_all = "camelCase")]
pub enum Verdict {
    /// Nothing to protect
    Clear,
    /// Blocking, show the guard's default message
    Blocked,
    /// Blocking, show this message instead of the default
    BlockedWith(String),
}

impl Verdict {
    /// Blocking verdict carrying a custom message.
    ///
    /// An empty message is not a blocking result and collapses to `Clear`.
    pub fn with_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self::Clear
        } else {
            Self::BlockedWith(message)
        }
    }

    /// Collapse a `BlockedWith("")` built directly or deserialized into `Clear`
    pub fn normalized(self) -> Self {
        match self {
            Self::BlockedWith(message) if message.is_empty() => Self::Clear,
            other => other,
        }
    }

    pub fn is_blocking(&self) -> bool {
        match self {
            Self::Clear => false,
            Self::Blocked => true,
            Self::BlockedWith(message) => !message.is_empty(),
        }
    }

    /// Custom message carried by the verdict, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::BlockedWith(message) if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    /// Message the user should see: the custom one wins over `default`.
    /// `None` when the verdict does not block.
    pub fn resolve<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match self {
            Self::Clear => None,
            Self::Blocked => Some(default),
            Self::BlockedWith(message) if message.is_empty() => None,
            Self::BlockedWith(message) => Some(message),
        }
    }
}

impl From<bool> for Verdict {
    fn from(blocking: bool) -> Self {
        if blocking { Self::Blocked } else { Self::Clear }
    }
}

impl From<String> for Verdict {
    fn from(message: String) -> Self {
        Self::with_message(message)
    }
}

impl From<&str> for Verdict {
    fn from(message: &str) -> Self {
        Self::with_message(message)
    }
}

impl From<Option<String>> for Verdict {
    fn from(message: Option<String>) -> Self {
        message.map(Self::with_message).unwrap_or(Self::Clear)
    }
}

/// Stable identity of a condition inside a guard, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionId(Uuid);

impl ConditionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type Predicate = dyn Fn() -> Result<Verdict, BoxError>;

/// Zero-argument blocking predicate
///
/// Cloning a condition shares the predicate and keeps its id.
#[derive(Clone)]
pub struct Condition {
    id: ConditionId,
    predicate: Rc<Predicate>,
}

impl Condition {
    /// Infallible predicate returning anything convertible to a verdict
    /// (`bool`, `&str`, `String`, `Option<String>`, `Verdict`)
    pub fn new<F, V>(predicate: F) -> Self
    where
        F: Fn() -> V + 'static,
        V: Into<Verdict>,
    {
        Self::from_rc(Rc::new(move || -> Result<Verdict, BoxError> {
            Ok(predicate().into())
        }))
    }

    /// Predicate that may fail; failures are propagated by the guard, never caught
    pub fn fallible<F, V, E>(predicate: F) -> Self
    where
        F: Fn() -> Result<V, E> + 'static,
        V: Into<Verdict>,
        E: Into<BoxError>,
    {
        Self::from_rc(Rc::new(move || -> Result<Verdict, BoxError> {
            predicate().map(Into::into).map_err(Into::into)
        }))
    }

    fn from_rc(predicate: Rc<Predicate>) -> Self {
        Self {
            id: ConditionId::new(),
            predicate,
        }
    }

    pub fn id(&self) -> ConditionId {
        self.id
    }

    pub fn evaluate(&self) -> Result<Verdict, BoxError> {
        (self.predicate)()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").field("id", &self.id).finish()
    }
}

/// Conditions accepted at construction: one predicate, a list, or none yet
#[derive(Debug, Clone, Default)]
pub enum Conditions {
    #[default]
    None,
    Single(Condition),
    Many(Vec<Condition>),
}

impl Conditions {
    /// Normalize into the ordered list the guard evaluates
    pub fn into_vec(self) -> Vec<Condition> {
        match self {
            Self::None => Vec::new(),
            Self::Single(condition) => vec![condition],
            Self::Many(conditions) => conditions,
        }
    }
}

impl From<Condition> for Conditions {
    fn from(condition: Condition) -> Self {
        Self::Single(condition)
    }
}

impl From<Vec<Condition>> for Conditions {
    fn from(conditions: Vec<Condition>) -> Self {
        Self::Many(conditions)
    }
}

impl From<Option<Condition>> for Conditions {
    fn from(condition: Option<Condition>) -> Self {
        condition.map(Self::Single).unwrap_or(Self::None)
    }
}
