use thiserror::Error;

/// Namespace prepended to every guard error so callers can tell them apart
/// from unrelated failures.
pub const ERROR_PREFIX: &str = "before-unload";

/// Boxed error returned by fallible condition predicates
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the guard
#[derive(Error, Debug)]
pub enum GuardError {
    /// Message missing, empty, or not text
    #[error("{prefix}: You must provide a message (got {found}).", prefix = ERROR_PREFIX)]
    InvalidMessage { found: String },

    /// Conditions neither a single condition, a list of conditions, nor absent
    #[error(
        "{prefix}: You must provide either a list of conditions, a condition, or nothing (got {found}).",
        prefix = ERROR_PREFIX
    )]
    InvalidConditions { found: String },

    /// `register` called while a subscription is active under the reject policy
    #[error("{prefix}: The unload handler is already registered.", prefix = ERROR_PREFIX)]
    AlreadyRegistered,

    /// A condition predicate failed while being evaluated
    #[error("{prefix}: Condition #{index} failed: {source}", prefix = ERROR_PREFIX)]
    Condition {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A flag condition referenced a flag the board does not know
    #[error("{prefix}: Unknown flag '{0}'.", prefix = ERROR_PREFIX)]
    UnknownFlag(String),
}

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

impl GuardError {
    /// Create an invalid message error
    pub fn invalid_message(found: impl Into<String>) -> Self {
        Self::InvalidMessage {
            found: found.into(),
        }
    }

    /// Create an invalid conditions error
    pub fn invalid_conditions(found: impl Into<String>) -> Self {
        Self::InvalidConditions {
            found: found.into(),
        }
    }

    /// Wrap a predicate failure with the position of the failing condition
    pub fn condition(index: usize, source: impl Into<BoxError>) -> Self {
        Self::Condition {
            index,
            source: source.into(),
        }
    }
}
