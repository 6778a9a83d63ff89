//! Publish command implementation

use crate::cli::args::PublishArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::error::Result;
use crate::hf_pipeline::{HfPublisher, PublishConfig};

pub fn run_publish(args: PublishArgs, level: LogLevel) -> Result<()> {
    let mut config = PublishConfig::model(args.repo, None);
    config.private = args.private;
    let publisher = HfPublisher::new(config)?;

    log(
        level,
        LogLevel::Normal,
        &format!("Publishing {} to {}", args.dir.display(), publisher.repo_url()),
    );
    let result = publisher.publish_folder(&args.dir)?;
    log(level, LogLevel::Normal, &result.to_string());
    Ok(())
}
