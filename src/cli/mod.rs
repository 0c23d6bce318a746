use crate::guard::RegisterPolicy;
use crate::platform::EventModel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod error;
pub mod handler;
pub mod output;

/// unload-guard - simulate a page's before-unload guard
#[derive(Parser, Debug)]
#[command(name = "unload-guard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Override config directory path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Page description file (defaults to general.default_page from the config)
    #[arg(long, global = true, value_name = "FILE")]
    pub page: Option<PathBuf>,

    /// Override a page flag, e.g. --set draft_dirty=true (repeatable)
    #[arg(long = "set", global = true, value_name = "NAME=BOOL", value_parser = parse_flag_assignment)]
    pub flags: Vec<(String, bool)>,

    /// Override guard.register_policy (unregister_first, replace, reject)
    #[arg(long, global = true, value_name = "POLICY", value_parser = parse_register_policy)]
    pub policy: Option<RegisterPolicy>,

    /// Force the unload event model (standard, legacy)
    #[arg(long, global = true, value_name = "MODEL", value_parser = parse_event_model)]
    pub event_model: Option<EventModel>,

    /// Enable verbose logging (TRACE level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the page's conditions
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fire the unload notification at the page
    Unload {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register the page's guard once more and report its subscriptions
    ///
    /// Shows what the register policy does with a second registration.
    Register {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a labelled action through the confirmation gate
    Act {
        /// Action label shown in the output
        label: String,

        /// Answer the confirmation with yes
        #[arg(long, conflicts_with = "no")]
        yes: bool,

        /// Answer the confirmation with no
        #[arg(long)]
        no: bool,

        /// Keep the unload subscription after a confirmed action
        #[arg(long)]
        preserve_handlers: bool,
    },

    /// Manage configuration
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Print the config file path
    Path,

    /// Write the effective configuration to the config file
    Init,
}

/// Parse `NAME=BOOL` (BOOL: true/false/1/0/yes/no/on/off)
pub fn parse_flag_assignment(s: &str) -> Result<(String, bool), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=BOOL, got '{}'", s))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing flag name in '{}'", s));
    }

    let value = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        other => return Err(format!("invalid boolean '{}' for flag '{}'", other, name)),
    };

    Ok((name.to_string(), value))
}

pub fn parse_register_policy(s: &str) -> Result<RegisterPolicy, String> {
    RegisterPolicy::from_str(s).ok_or_else(|| {
        format!(
            "unknown policy '{}' (expected unregister_first, replace or reject)",
            s
        )
    })
}

pub fn parse_event_model(s: &str) -> Result<EventModel, String> {
    EventModel::from_str(s)
        .ok_or_else(|| format!("unknown event model '{}' (expected standard or legacy)", s))
}
