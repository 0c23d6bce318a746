use super::error;
use super::output;
use super::{Commands, ConfigAction};
use crate::app::config::Config;
use crate::guard::{GuardError, RegisterPolicy};
use crate::page::{PageSession, PageSpec};
use crate::platform::{ConfirmDialog, EventModel};
use crate::platform::memory::ScriptedDialog;
use crate::platform::terminal::TerminalDialog;
use anyhow::Result;
use std::path::PathBuf;
use std::rc::Rc;

/// Page and flag overrides shared by the page commands
#[derive(Debug, Clone, Default)]
pub struct PageArgs {
    pub page: Option<PathBuf>,
    pub flags: Vec<(String, bool)>,
}

/// Load guard.toml and apply command-line overrides.
///
/// Only a missing file falls back to defaults. A file that exists but does not
/// load is an error, so nothing later writes defaults over it.
pub fn load_config(
    policy: Option<RegisterPolicy>,
    event_model: Option<EventModel>,
) -> Result<Config> {
    let mut config = Config::load()?;

    if let Some(policy) = policy {
        config.guard.register_policy = policy;
    }
    if let Some(model) = event_model {
        config.guard.event_model = Some(model);
    }

    tracing::info!(
        "Register policy: {}, event model: {}",
        config.guard.register_policy.name(),
        config
            .guard
            .event_model
            .map(|model| model.event_name())
            .unwrap_or("per target")
    );
    Ok(config)
}

/// Handle a CLI command and return exit code
pub fn handle_command(command: Commands, config: &Config, args: PageArgs) -> i32 {
    let result = match command {
        Commands::Check { json } => handle_check(config, &args, json),
        Commands::Unload { json } => handle_unload(config, &args, json),
        Commands::Register { json } => handle_register(config, &args, json),
        Commands::Act {
            label,
            yes,
            no,
            preserve_handlers,
        } => handle_act(config, &args, label, yes, no, preserve_handlers),
        Commands::Config { action } => handle_config(action, config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    }
}

/// Validation failures are the caller's input; everything else is an error
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<GuardError>() {
        Some(GuardError::InvalidMessage { .. } | GuardError::InvalidConditions { .. }) => {
            error::INVALID_INPUT
        }
        _ => error::ERROR,
    }
}

/// Resolve the page file: --page wins over the configured default
fn load_page(config: &Config, args: &PageArgs) -> Result<PageSpec> {
    let path = args
        .page
        .clone()
        .or_else(|| config.general.default_page.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No page given: pass --page or set general.default_page")
        })?;

    PageSpec::load(&path)
}

fn open_session(
    config: &Config,
    args: &PageArgs,
    dialog: Rc<dyn ConfirmDialog>,
) -> Result<PageSession> {
    let page = load_page(config, args)?;
    Ok(PageSession::open(&page, &config.guard, &args.flags, dialog)?)
}

/// Evaluate the page's conditions
fn handle_check(config: &Config, args: &PageArgs, json: bool) -> Result<i32> {
    let session = open_session(config, args, Rc::new(ScriptedDialog::always(false)))?;
    let verdict = session.check()?;

    println!(
        "{}",
        output::format_verdict(&verdict, session.guard().message(), json)
    );

    let code = if verdict.is_blocking() {
        error::BLOCKED
    } else {
        error::SUCCESS
    };
    session.close();
    Ok(code)
}

/// Fire the unload notification
fn handle_unload(config: &Config, args: &PageArgs, json: bool) -> Result<i32> {
    let session = open_session(config, args, Rc::new(ScriptedDialog::always(false)))?;
    let outcome = session.unload()?;

    println!("{}", output::format_unload(&outcome, json));

    let code = if outcome.warning().is_some() {
        error::BLOCKED
    } else {
        error::SUCCESS
    };
    session.close();
    Ok(code)
}

/// Register the guard a second time under the configured policy
fn handle_register(config: &Config, args: &PageArgs, json: bool) -> Result<i32> {
    let session = open_session(config, args, Rc::new(ScriptedDialog::always(false)))?;
    let policy = session.guard().register_policy();

    let result = session.guard().register();
    if let Err(e) = result {
        session.close();
        return Err(e.into());
    }

    println!(
        "{}",
        output::format_register(policy.name(), session.window().listener_count(), json)
    );
    session.close();
    Ok(error::SUCCESS)
}

/// Run a labelled action through the confirmation gate
fn handle_act(
    config: &Config,
    args: &PageArgs,
    label: String,
    yes: bool,
    no: bool,
    preserve_handlers: bool,
) -> Result<i32> {
    let dialog: Rc<dyn ConfirmDialog> = if yes {
        Rc::new(ScriptedDialog::always(true))
    } else if no {
        Rc::new(ScriptedDialog::always(false))
    } else {
        Rc::new(TerminalDialog::stdio())
    };

    let session = open_session(config, args, dialog)?;
    let preserve = preserve_handlers || config.guard.preserve_handlers;

    let ran = session.act(
        || tracing::info!("Running action '{}'", label),
        preserve,
    )?;

    println!(
        "{}",
        output::format_action(&label, ran.is_some(), session.guard().is_registered())
    );

    let code = if ran.is_some() {
        error::SUCCESS
    } else {
        error::DECLINED
    };
    session.close();
    Ok(code)
}

/// Handle config commands
fn handle_config(action: ConfigAction, config: &Config) -> Result<i32> {
    match action {
        ConfigAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("{}", toml::to_string_pretty(config)?);
            }
        }
        ConfigAction::Path => {
            println!("{}", crate::util::paths::get_config_path()?.display());
        }
        ConfigAction::Init => {
            config.save()?;
            println!(
                "Configuration written to {}",
                crate::util::paths::get_config_path()?.display()
            );
        }
    }

    Ok(error::SUCCESS)
}
