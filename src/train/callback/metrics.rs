//! JSON-lines metrics sink under `{output_dir}/runs/`

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::traits::{CallbackContext, LogEntry, TrainerCallback};
use crate::train::error::{Result, TrainError};

/// File name of the metrics log inside a run directory
pub const METRICS_FILE: &str = "metrics.jsonl";

/// Appends every logged entry as one JSON line
///
/// Each run gets its own timestamped directory under `runs/`; the file is
/// created lazily on the first entry.
#[derive(Debug)]
pub struct MetricsLog {
    run_dir: PathBuf,
    file: Option<File>,
}

impl MetricsLog {
    /// Sink for a run writing into `output_dir`
    pub fn new(output_dir: &Path) -> Self {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
        Self {
            run_dir: output_dir.join("runs").join(stamp.to_string()),
            file: None,
        }
    }

    /// Directory receiving [`METRICS_FILE`]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn file(&mut self) -> std::io::Result<&mut File> {
        if self.file.is_none() {
            std::fs::create_dir_all(&self.run_dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.run_dir.join(METRICS_FILE))?;
            self.file = Some(file);
        }
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(std::io::Error::other("metrics file unavailable")),
        }
    }
}

impl TrainerCallback for MetricsLog {
    fn on_log(&mut self, _ctx: &CallbackContext, entry: &LogEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;
        let file = self.file().map_err(|e| TrainError::Callback {
            name: "MetricsLog",
            message: e.to_string(),
        })?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MetricsLog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_metrics_log_appends_lines() {
        let dir = TempDir::new().unwrap();
        let mut log = MetricsLog::new(dir.path());
        assert!(log.run_dir().starts_with(dir.path().join("runs")));
        assert!(!log.run_dir().exists());

        let ctx = CallbackContext::default();
        for step in 1..=3 {
            let entry = LogEntry {
                global_step: step,
                loss: Some(1.0 / step as f32),
                ..Default::default()
            };
            log.on_log(&ctx, &entry).unwrap();
        }

        let content = std::fs::read_to_string(log.run_dir().join(METRICS_FILE)).unwrap();
        let entries: Vec<LogEntry> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].global_step, 3);
    }
}
