use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use unload_guard::cli::{self, Cli, handler::PageArgs};

fn main() {
    // Parse CLI arguments first to get verbose flag
    let cli = Cli::parse();

    // Config override must be in place before the logs dir is resolved
    if let Some(ref config_dir) = cli.config {
        unload_guard::util::paths::set_config_dir_override(Some(config_dir.clone()));
    }

    // Get logs directory (creates if needed)
    let logs_dir =
        unload_guard::util::paths::get_logs_dir().unwrap_or_else(|_| PathBuf::from("."));
    std::fs::create_dir_all(&logs_dir).ok();

    // Set up daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.jsonl");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Set log level based on verbose flag
    let log_level = if cli.verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };

    // Initialize logging with JSON format for structured logs
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(
                    log_level,
                )),
        )
        .init();

    tracing::info!("Starting unload-guard...");
    if cli.verbose {
        tracing::info!("Verbose logging enabled (TRACE level)");
    }
    tracing::trace!("CLI arguments: {:?}", cli);

    if let Some(ref config_dir) = cli.config {
        tracing::info!("Using config directory override: {:?}", config_dir);
    }

    let config = match cli::handler::load_config(cli.policy, cli.event_model) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            eprintln!("Error: {:#}", e);
            drop(_guard);
            std::process::exit(cli::handler::exit_code_for(&e));
        }
    };
    tracing::info!("Config loaded: {:?}", config);

    let args = PageArgs {
        page: cli.page,
        flags: cli.flags,
    };

    let exit_code = cli::handler::handle_command(cli.command, &config, args);

    // Flush buffered log lines before exiting
    drop(_guard);
    std::process::exit(exit_code);
}
