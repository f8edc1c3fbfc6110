mod analyze;
mod config_cmd;
mod model_cmd;
mod train;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use analyze::AnalyzeCommand;
pub use train::TrainCommand;

#[derive(Parser)]
#[command(name = "rep-coach")]
#[command(about = "Rep counting and form scoring for push-ups and squats", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = crate::config::CONFIG_ENV)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a reference model from recorded landmark files
    Train(TrainCommand),

    /// Replay a recording as a live session and score every rep
    Analyze(AnalyzeCommand),

    /// Inspect trained reference models
    #[command(subcommand)]
    Model(ModelSubcommands),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigSubcommands),
}

#[derive(Subcommand)]
enum ModelSubcommands {
    /// Show a trained model
    Show {
        /// Exercise id, e.g. pushup or squat
        exercise: String,

        /// Print the raw model as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show current configuration
    Show,

    /// Initialize configuration with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        let config_path = self.config.as_deref();

        match self.command {
            Commands::Train(cmd) => cmd.execute(config_path).await,
            Commands::Analyze(cmd) => cmd.execute(config_path).await,
            Commands::Model(subcmd) => match subcmd {
                ModelSubcommands::Show { exercise, json } => {
                    model_cmd::show_model(config_path, &exercise, json).await
                }
            },
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config(config_path).await,
                ConfigSubcommands::Init { force } => config_cmd::init_config(config_path, force).await,
            },
        }
    }
}
