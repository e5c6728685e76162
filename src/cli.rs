use std::path::{Path, PathBuf};

mod classify;
mod generate;
mod init;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use classify::Classify;
use generate::Generate;
use srsgen::Config;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = "srs.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Generate a requirements document from function documentation
    Generate(Generate),

    /// Show how each documented function is classified
    Classify(Classify),

    /// Write a default configuration file
    Init(init::Command),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Generate(command) => command.run(load_config(config_path)?)?,
            Self::Classify(command) => command.run(load_config(config_path)?)?,
            Self::Init(command) => command.run(config_path)?,
        }
        Ok(())
    }
}

/// Loads the configuration file if present, otherwise the defaults, then
/// applies environment overrides.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = if path.exists() {
        Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "no configuration file, using defaults");
        Config::default()
    };
    Ok(config.with_env_overrides())
}
