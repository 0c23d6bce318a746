use serde::{Deserialize, Serialize};

/// How a target expects unload listeners to be attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventModel {
    /// `addEventListener("beforeunload", ...)`
    #[default]
    Standard,
    /// `attachEvent("onbeforeunload", ...)` on old platforms
    Legacy,
}

impl EventModel {
    /// Parse from a config or command-line string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standard" | "beforeunload" | "addEventListener" => Some(Self::Standard),
            "legacy" | "onbeforeunload" | "attachEvent" => Some(Self::Legacy),
            _ => None,
        }
    }

    /// Event name the listener is keyed under
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Standard => "beforeunload",
            Self::Legacy => "onbeforeunload",
        }
    }
}

/// Event delivered to unload listeners
///
/// `return_value` is the slot the platform reads the warning text from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnloadEvent {
    /// Event name as delivered
    #[serde(rename = "type")]
    pub event_type: String,
    /// Warning text (writable); untouched when no listener objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_value: Option<String>,
}

impl UnloadEvent {
    pub fn new(model: EventModel) -> Self {
        Self {
            event_type: model.event_name().to_string(),
            return_value: None,
        }
    }

    /// True once some listener asked the platform to warn the user
    pub fn is_blocked(&self) -> bool {
        self.return_value.is_some()
    }
}
