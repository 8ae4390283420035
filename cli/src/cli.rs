//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Install and run containerized apps from plugin descriptors
#[derive(Parser)]
#[command(
    name = "apphub",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List known apps and their state
    List,

    /// Show one app's state and settings
    Status(commands::KeyArgs),

    /// Check out an app's source and pull its images
    Install(commands::install::InstallArgs),

    /// Start an installed app in the background
    Start(commands::KeyArgs),

    /// Stop a running app
    Stop(commands::KeyArgs),

    /// Remove an app's images, source checkout and record
    Uninstall(commands::uninstall::UninstallArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command
    /// fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
        } = self;

        if matches!(command, Command::Version) {
            return commands::version::run(json);
        }

        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        })?;

        match command {
            Command::List => commands::list::run(&app).await,
            Command::Status(args) => commands::status::run(&app, &args.key).await,
            Command::Install(args) => commands::install::run(&app, &args).await,
            Command::Start(args) => commands::start::run(&app, &args.key).await,
            Command::Stop(args) => commands::stop::run(&app, &args.key).await,
            Command::Uninstall(args) => commands::uninstall::run(&app, &args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(json),
        }
    }
}
