//! Merge command implementation

use crate::cli::args::MergeArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::error::Result;
use crate::lora::merge_adapter;
use crate::tokenizer::{HfTokenizer, TOKENIZER_FILE};

pub fn run_merge(args: MergeArgs, level: LogLevel) -> Result<()> {
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Merging {} into {}",
            args.adapter.display(),
            args.base.display()
        ),
    );

    // The merged vocabulary follows the tokenizer that lands in the output
    if !args.output.join(TOKENIZER_FILE).exists() {
        let source = if args.adapter.join(TOKENIZER_FILE).exists() {
            &args.adapter
        } else {
            &args.base
        };
        if source.join(TOKENIZER_FILE).exists() {
            HfTokenizer::from_dir(source)?.save(&args.output)?;
        }
    }

    let report = merge_adapter(&args.base, &args.output, &args.adapter)?;
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Merged {} modules (vocab {}) into {}",
            report.merged_modules,
            report.vocab_size,
            report.output.display()
        ),
    );
    Ok(())
}
