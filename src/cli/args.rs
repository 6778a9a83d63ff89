//! Command-line argument types

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Afinar: causal language model fine-tuning
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "afinar")]
#[command(version)]
#[command(about = "Fine-tune causal language models with full training or LoRA adapters")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a fine-tuning job from a YAML or JSON configuration
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Merge a saved LoRA adapter into its base model
    Merge(MergeArgs),

    /// Publish a model directory to the Hugging Face Hub
    Publish(PublishArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to the job configuration
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override the output directory
    #[arg(long)]
    pub project_name: Option<String>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f64>,

    /// Override train batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Publish the result (requires repo_id in the configuration)
    #[arg(long)]
    pub push_to_hub: bool,

    /// Validate and print the resolved training arguments without training
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to the job configuration
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the merge command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct MergeArgs {
    /// Base model directory
    #[arg(long)]
    pub base: PathBuf,

    /// Directory holding adapter_config.json and adapter_model.safetensors
    #[arg(long)]
    pub adapter: PathBuf,

    /// Output directory for the merged model
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the publish command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct PublishArgs {
    /// Directory to upload
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Target repository (owner/name)
    #[arg(long)]
    pub repo: String,

    /// Create the repository as private
    #[arg(long)]
    pub private: bool,
}

/// Parse arguments from an iterator (for tests and embedding)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
