use crate::app::run_app;
use crate::config::{config_path, load_config, save_config};
use crate::startup::StartupEntry;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "sit-smart-coach",
    version,
    about = "Floating webcam posture coach"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start monitoring (the default)
    Run {
        /// Log feedback instead of showing the popup
        #[arg(long)]
        headless: bool,
        /// Camera index, overriding the configuration
        #[arg(short, long)]
        camera: Option<u32>,
    },
    /// Print the feedback shown by the running instance
    Status,
    /// Stop the running instance
    Quit,
    /// Manage the auto-start entry
    Startup {
        #[command(subcommand)]
        action: StartupAction,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StartupAction {
    /// Launch at login
    Add,
    /// Stop launching at login
    Remove,
    /// Report whether the entry exists
    Status,
}

#[derive(Subcommand, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration if none exists
    Init,
}

pub fn run_cli() -> ExitCode {
    crate::logging::init();
    let cli = Cli::parse();
    execute(cli)
}

pub fn execute(cli: Cli) -> ExitCode {
    match cli.command.unwrap_or(Commands::Run {
        headless: false,
        camera: None,
    }) {
        Commands::Run { headless, camera } => {
            let mut cfg = load_config();
            if let Some(index) = camera {
                cfg.camera_index = index;
            }
            run_app(cfg, headless);
            ExitCode::SUCCESS
        }
        Commands::Status => print_status(),
        Commands::Quit => quit(),
        Commands::Startup { action } => startup(action),
        Commands::Config { action } => config(action),
    }
}

#[cfg(unix)]
fn print_status() -> ExitCode {
    match crate::ipc::query_status() {
        Ok(Some(snapshot)) => {
            println!("{:?}", snapshot.state);
            println!("{}", snapshot.feedback);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            error!("running instance sent no status");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("no running instance: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn quit() -> ExitCode {
    match crate::ipc::send_command(crate::ipc::ControlMessage::Quit) {
        Ok(_) => {
            info!("quit sent");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("no running instance: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(unix))]
fn print_status() -> ExitCode {
    error!("the control socket is only available on Unix");
    ExitCode::FAILURE
}

#[cfg(not(unix))]
fn quit() -> ExitCode {
    error!("the control socket is only available on Unix");
    ExitCode::FAILURE
}

fn startup(action: StartupAction) -> ExitCode {
    let entry = match StartupEntry::for_current_exe() {
        Ok(entry) => entry,
        Err(e) => {
            error!("cannot locate the startup entry: {e}");
            return ExitCode::FAILURE;
        }
    };
    let result = match action {
        StartupAction::Add => entry.register().map(|_| ()),
        StartupAction::Remove => entry.unregister().map(|_| ()),
        StartupAction::Status => {
            let state = if entry.is_registered() { "registered" } else { "not registered" };
            println!("{state}: {}", entry.path().display());
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("startup update failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn config(action: ConfigAction) -> ExitCode {
    match action {
        ConfigAction::Show => match serde_json::to_string_pretty(&load_config()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("failed to encode config: {e}");
                ExitCode::FAILURE
            }
        },
        ConfigAction::Init => {
            let path = config_path();
            if path.exists() {
                info!(path = %path.display(), "config already exists");
                return ExitCode::SUCCESS;
            }
            match save_config(&crate::config::Config::default()) {
                Ok(path) => {
                    info!(path = %path.display(), "wrote default config");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("failed to write config: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
