//! # faultline
//!
//! Command-line host for the reporter: send a failure read from stdin, or
//! check that the configured webhook resolves.

#![deny(unsafe_code)]

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faultline_core::Failure;
use faultline_reporter::Reporter;
use faultline_settings::{
    load_settings_with_report, settings_path, LoadedSettings, LoggingSettings,
};
use faultline_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{info, warn, Level};

/// Report failures to a webhook.
#[derive(Parser, Debug)]
#[command(name = "faultline", about = "Report failures to a webhook")]
struct Cli {
    /// Settings file (defaults to `~/.faultline/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report one failure. Stack frames are read from stdin, one per line.
    Send {
        /// Failure type, e.g. `ValueError`.
        #[arg(long = "type")]
        type_name: String,

        #[arg(long)]
        message: String,

        /// Command that was running when the failure happened.
        #[arg(long)]
        command: Option<String>,

        /// Event that was being handled.
        #[arg(long)]
        event: Option<String>,
    },
    /// Resolve the webhook identity and print it.
    Check,
}

fn load(cli: &Cli) -> Result<LoadedSettings> {
    let path = cli.settings.clone().unwrap_or_else(settings_path);
    load_settings_with_report(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

fn telemetry_config(logging: &LoggingSettings) -> TelemetryConfig {
    let parse = |name: &str, value: &str| {
        value.parse::<Level>().unwrap_or_else(|_| {
            eprintln!("faultline: unknown log level {value:?} for {name}, using info");
            Level::INFO
        })
    };
    TelemetryConfig {
        log_level: parse("logging.level", logging.level.as_str()),
        module_levels: logging
            .modules
            .iter()
            .map(|(module, level)| (module.clone(), parse(module.as_str(), level.as_str())))
            .collect(),
        json: logging.json,
    }
}

fn read_frames() -> Result<Vec<String>> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stack frames from stdin")?;
    Ok(input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// A free-form command name has no invocation context to hang off, so it is
/// folded into the failure message.
fn build_failure(
    type_name: String,
    message: String,
    command: Option<&str>,
    frames: Vec<String>,
) -> Failure {
    let message = match command {
        Some(command) => format!("{message} (while running {command})"),
        None => message,
    };
    Failure::new(type_name, message).with_frames(frames)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let LoadedSettings { settings, ignored } = load(&cli)?;
    if let Err(e) = init_telemetry(telemetry_config(&settings.logging)) {
        eprintln!("faultline: logging not initialized: {e}");
    }
    for o in &ignored {
        warn!(
            key = o.key,
            value = %o.value,
            expected = %o.expected,
            "invalid env override, ignoring"
        );
    }
    settings.validate().context("Invalid settings")?;

    let reporter = Reporter::from_settings(&settings)?;

    match cli.command {
        Command::Send {
            type_name,
            message,
            command,
            event,
        } => {
            let frames = if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
                Vec::new()
            } else {
                read_frames()?
            };
            let failure = build_failure(type_name, message, command.as_deref(), frames);
            let signature = failure.render();

            reporter
                .add_error(failure, None, event.as_deref())
                .await
                .context("Failed to deliver report")?;

            let count = reporter.occurrences(&signature).len();
            info!(occurrences = count, "report delivered");
        }
        Command::Check => {
            let identity = reporter
                .delivery()
                .resolve_identity()
                .await
                .context("Failed to resolve webhook")?;
            if identity.guild_id.is_none() {
                warn!(webhook_id = %identity.id, "webhook is not attached to a guild");
            }
            println!("webhook:  {}", identity.id);
            println!("name:     {}", identity.name.as_deref().unwrap_or("-"));
            println!("channel:  {}", identity.channel_id.as_deref().unwrap_or("-"));
            println!("guild:    {}", identity.guild_id.as_deref().unwrap_or("-"));
            if let Some(avatar) = identity.avatar_url() {
                println!("avatar:   {avatar}");
            }
        }
    }

    Ok(())
}
