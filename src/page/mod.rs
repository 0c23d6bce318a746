/// Page descriptions
///
/// A page file is the dynamic boundary of the guard: values arrive untyped
/// from TOML and are validated here into typed conditions before a guard is
/// built.
///
/// ```toml
/// message = "You have unsaved changes."
///
/// [[conditions]]
/// flag = "draft_dirty"
/// message = "Your draft is not saved."
///
/// [flags]
/// draft_dirty = true
/// ```
///
/// `conditions` may also be a single table, or be left out.

pub mod flags;
pub mod session;

pub use flags::FlagBoard;
pub use session::PageSession;

use crate::app::config::GuardSettings;
use crate::guard::{Condition, Conditions, Guard, GuardError, GuardResult, Verdict};
use crate::platform::HostBindings;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Condition that blocks while a named flag is raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagCondition {
    pub flag: String,
    /// Custom warning text; the guard's default message when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FlagCondition {
    /// Predicate reading `board` each time it is evaluated
    pub fn to_condition(&self, board: &FlagBoard) -> Condition {
        let board = board.clone();
        let flag = self.flag.clone();
        let message = self.message.clone();

        Condition::fallible(move || -> GuardResult<Verdict> {
            let raised = board
                .get(&flag)
                .ok_or_else(|| GuardError::UnknownFlag(flag.clone()))?;

            Ok(match (raised, &message) {
                (false, _) => Verdict::Clear,
                (true, Some(message)) => Verdict::with_message(message.clone()),
                (true, None) => Verdict::Blocked,
            })
        })
    }
}

/// Shape the `conditions` key was given in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConditionsSpec {
    #[default]
    None,
    Single(FlagCondition),
    Many(Vec<FlagCondition>),
}

impl ConditionsSpec {
    /// Validate an untyped `conditions` value: a table, an array of tables, or absent
    pub fn from_value(value: Option<&toml::Value>) -> GuardResult<Self> {
        match value {
            None => Ok(Self::None),
            Some(toml::Value::Table(_)) => Ok(Self::Single(Self::parse_one(value)?)),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    toml::Value::Table(_) => Self::parse_one(Some(item)),
                    other => Err(GuardError::invalid_conditions(format!(
                        "an array containing {}",
                        other.type_str()
                    ))),
                })
                .collect::<GuardResult<Vec<_>>>()
                .map(Self::Many),
            Some(other) => Err(GuardError::invalid_conditions(other.type_str())),
        }
    }

    fn parse_one(value: Option<&toml::Value>) -> GuardResult<FlagCondition> {
        let Some(value) = value else {
            return Err(GuardError::invalid_conditions("nothing"));
        };
        value
            .clone()
            .try_into()
            .map_err(|e| GuardError::invalid_conditions(format!("a malformed condition ({})", e)))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed conditions bound to `board`, keeping the declared shape
    pub fn to_conditions(&self, board: &FlagBoard) -> Conditions {
        match self {
            Self::None => Conditions::None,
            Self::Single(condition) => Conditions::Single(condition.to_condition(board)),
            Self::Many(items) => Conditions::Many(
                items
                    .iter()
                    .map(|condition| condition.to_condition(board))
                    .collect(),
            ),
        }
    }
}

/// Validated page description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSpec {
    /// Overrides the configured default message
    pub message: Option<String>,
    /// Overrides the configured auto-register setting
    pub auto_register: Option<bool>,
    pub conditions: ConditionsSpec,
    /// Initial flag values
    pub flags: BTreeMap<String, bool>,
}

impl PageSpec {
    /// Load and validate a page file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read page {:?}", path))?;
        let page = Self::parse(&content).context(format!("Invalid page {:?}", path))?;
        tracing::debug!(
            "Loaded page {:?}: {} condition(s), {} flag(s)",
            path,
            page.conditions.len(),
            page.flags.len()
        );
        Ok(page)
    }

    /// Parse page TOML. Validation failures surface as [`GuardError`] inside the anyhow error.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let table: toml::Table = toml::from_str(content).context("Failed to parse page TOML")?;
        Self::from_table(&table)
    }

    pub fn from_table(table: &toml::Table) -> anyhow::Result<Self> {
        // Message first: nothing else is looked at when it is wrong
        let message = match table.get("message") {
            None => None,
            Some(toml::Value::String(message)) if message.is_empty() => {
                return Err(GuardError::invalid_message("an empty string").into());
            }
            Some(toml::Value::String(message)) => Some(message.clone()),
            Some(other) => return Err(GuardError::invalid_message(other.type_str()).into()),
        };

        let conditions = ConditionsSpec::from_value(table.get("conditions"))?;

        let auto_register = match table.get("auto_register") {
            None => None,
            Some(toml::Value::Boolean(value)) => Some(*value),
            Some(other) => anyhow::bail!("auto_register must be a boolean, got {}", other.type_str()),
        };

        let flags: BTreeMap<String, bool> = match table.get("flags") {
            None => BTreeMap::new(),
            Some(value) => value
                .clone()
                .try_into()
                .context("flags must be a table of booleans")?,
        };

        for key in table.keys() {
            if !matches!(
                key.as_str(),
                "message" | "conditions" | "auto_register" | "flags"
            ) {
                tracing::warn!("Ignoring unknown page key '{}'", key);
            }
        }

        Ok(Self {
            message,
            auto_register,
            conditions,
            flags,
        })
    }

    /// Board seeded with this page's flags
    pub fn flag_board(&self) -> FlagBoard {
        self.flags
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }

    /// Build a guard for this page. Page values win over `settings`.
    pub fn build_guard(
        &self,
        settings: &GuardSettings,
        board: &FlagBoard,
        host: HostBindings,
    ) -> GuardResult<Guard> {
        let mut builder = settings.builder().conditions(self.conditions.to_conditions(board));
        if let Some(message) = &self.message {
            builder = builder.message(message.clone());
        }
        if let Some(auto_register) = self.auto_register {
            builder = builder.auto_register(auto_register);
        }
        builder.build(host)
    }
}
