//! Checkpoint directory naming and rotation

use std::path::{Path, PathBuf};

use tracing::info;

use crate::train::error::Result;

pub const CHECKPOINT_PREFIX: &str = "checkpoint";

/// `{output_dir}/checkpoint-{step}`
#[must_use]
pub fn checkpoint_dir(output_dir: &Path, global_step: usize) -> PathBuf {
    output_dir.join(format!("{CHECKPOINT_PREFIX}-{global_step}"))
}

fn checkpoint_step(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix(CHECKPOINT_PREFIX)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

/// Checkpoints under `output_dir`, oldest first
///
/// The best checkpoint, if any, is moved to the second-to-last slot so that
/// rotation deletes it last.
pub fn sorted_checkpoints(output_dir: &Path, best: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut found: Vec<(usize, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(output_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(step) = checkpoint_step(&path) {
            found.push((step, path));
        }
    }
    found.sort_by_key(|(step, _)| *step);
    let mut sorted: Vec<PathBuf> = found.into_iter().map(|(_, p)| p).collect();

    if let Some(index) = best.and_then(|b| sorted.iter().position(|p| p == b)) {
        for i in index..sorted.len().saturating_sub(2) {
            sorted.swap(i, i + 1);
        }
    }
    Ok(sorted)
}

/// Delete the oldest checkpoints beyond `limit`; `0` keeps everything
///
/// With a limit of 1 and a best checkpoint that is not the latest, two are
/// kept so the best survives next to the most recent one.
pub fn rotate_checkpoints(
    output_dir: &Path,
    limit: usize,
    best: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let sorted = sorted_checkpoints(output_dir, best)?;
    if sorted.len() <= limit {
        return Ok(Vec::new());
    }
    let mut keep = limit;
    if let Some(best) = best {
        if limit == 1 && sorted.last().map(PathBuf::as_path) != Some(best) {
            keep = 2;
        }
    }
    let excess = sorted.len().saturating_sub(keep);
    let deleted: Vec<PathBuf> = sorted.into_iter().take(excess).collect();
    for path in &deleted {
        info!(
            path = %path.display(),
            "Deleting older checkpoint due to save_total_limit"
        );
        std::fs::remove_dir_all(path)?;
    }
    Ok(deleted)
}
