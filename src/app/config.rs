use crate::guard::{GuardBuilder, RegisterPolicy};
use crate::platform::EventModel;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Guard configuration (saved to config/guard.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub guard: GuardSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Page description used when --page is not given
    /// (relative paths resolve against the config directory)
    #[serde(default)]
    pub default_page: Option<PathBuf>,
}

/// Defaults applied to every guard built from this config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardSettings {
    /// Default warning text; a page may override it
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_auto_register")]
    pub auto_register: bool,
    #[serde(default)]
    pub register_policy: RegisterPolicy,
    /// Force an event model; absent means each target decides
    #[serde(default)]
    pub event_model: Option<EventModel>,
    /// Keep the unload subscription after a confirmed gated action
    #[serde(default)]
    pub preserve_handlers: bool,
}

fn default_message() -> String {
    "You have unsaved changes. Are you sure you want to leave this page?".to_string()
}

fn default_auto_register() -> bool {
    true
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            message: default_message(),
            auto_register: default_auto_register(),
            register_policy: RegisterPolicy::default(),
            event_model: None,
            preserve_handlers: false,
        }
    }
}

impl GuardSettings {
    /// Guard builder preloaded with these settings
    pub fn builder(&self) -> GuardBuilder {
        let builder = GuardBuilder::new(self.message.clone())
            .auto_register(self.auto_register)
            .register_policy(self.register_policy);

        match self.event_model {
            Some(model) => builder.event_model(model),
            None => builder,
        }
    }
}

impl Config {
    /// Load guard.toml from the config directory; a missing file means defaults
    pub fn load() -> anyhow::Result<Self> {
        let config_path = crate::util::paths::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;

        if let Some(page) = config.general.default_page.take() {
            config.general.default_page =
                Some(crate::util::paths::resolve_relative_to_config(&page));
        }

        Ok(config)
    }

    /// Load from an explicit path; a missing file means defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("Config not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {:?}", path))?;
        let config: Self =
            toml::from_str(&content).context(format!("Failed to parse {:?}", path))?;
        config.validate()?;

        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save guard.toml into the config directory
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = crate::util::paths::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;

        // Atomic write using temp file + rename
        let temp_path = path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &content).context("Failed to write temp config file")?;
        std::fs::rename(&temp_path, path).context("Failed to rename temp config file")?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.guard.message.is_empty() {
            anyhow::bail!("Invalid configuration: guard.message must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_config_toml() -> &'static str {
        r#"
[general]
default_page = "pages/editor.toml"

[guard]
message = "Leave without saving?"
auto_register = false
register_policy = "reject"
event_model = "legacy"
preserve_handlers = true
"#
    }

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.general.default_page, None);
        assert_eq!(config.guard.message, default_message());
        assert!(config.guard.auto_register);
        assert_eq!(config.guard.register_policy, RegisterPolicy::UnregisterFirst);
        assert_eq!(config.guard.event_model, None);
        assert!(!config.guard.preserve_handlers);
    }

    #[test]
    fn test_config_load_missing_file_uses_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_load_valid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("guard.toml");
        std::fs::write(&config_path, create_test_config_toml()).unwrap();

        let config = Config::load_from(&config_path).unwrap();

        assert_eq!(
            config.general.default_page,
            Some(PathBuf::from("pages/editor.toml"))
        );
        assert_eq!(config.guard.message, "Leave without saving?");
        assert!(!config.guard.auto_register);
        assert_eq!(config.guard.register_policy, RegisterPolicy::Reject);
        assert_eq!(config.guard.event_model, Some(EventModel::Legacy));
        assert!(config.guard.preserve_handlers);
    }

    #[test]
    fn test_config_partial_sections_use_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("guard.toml");
        std::fs::write(&config_path, "[guard]\npreserve_handlers = true\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.guard.message, default_message());
        assert!(config.guard.auto_register);
        assert!(config.guard.preserve_handlers);
    }

    #[test]
    fn test_config_load_invalid_toml_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("guard.toml");
        std::fs::write(&config_path, "this is not valid toml [[[").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_config_empty_message_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("guard.toml");
        std::fs::write(&config_path, "[guard]\nmessage = \"\"\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("guard.message"));
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("guard.toml");

        let mut config = Config::default();
        config.guard.message = "Discard the form?".to_string();
        config.guard.register_policy = RegisterPolicy::Replace;
        config.save_to(&config_path).unwrap();

        assert!(!config_path.with_extension("toml.tmp").exists());
        let loaded = Config::load_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_settings_builder_applies_defaults() {
        use crate::platform::HostBindings;
        use crate::platform::memory::{MemoryWindow, ScriptedDialog};
        use std::rc::Rc;

        let window = Rc::new(MemoryWindow::new());
        let host = HostBindings::new(window.clone(), Rc::new(ScriptedDialog::always(true)));

        let settings = GuardSettings {
            event_model: Some(EventModel::Legacy),
            register_policy: RegisterPolicy::Reject,
            ..GuardSettings::default()
        };
        let guard = settings.builder().build(host).unwrap();

        assert_eq!(guard.message(), default_message());
        assert_eq!(guard.register_policy(), RegisterPolicy::Reject);
        assert!(guard.is_registered());
        assert!(guard.register().is_err());
        guard.unregister();
    }
}
