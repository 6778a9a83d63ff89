//! Dataset sources: local directories and Hub dataset repos

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::hf_pipeline::error::{FetchError, Result};
use crate::hf_pipeline::fetcher::HfModelFetcher;

use super::format::{matches_split, read_all};
use super::text_dataset::TextDataset;

/// Somewhere split data files can be found
pub trait DatasetSource {
    /// Human-readable identifier for logs and errors
    fn name(&self) -> &str;

    /// Local paths of every data file belonging to `split`, in a stable order
    ///
    /// # Errors
    ///
    /// Returns `SplitNotFound` when no file matches.
    fn split_files(&self, split: &str) -> Result<Vec<PathBuf>>;

    /// Load every record of `split`
    fn load_split(&self, split: &str) -> Result<TextDataset> {
        let files = self.split_files(split)?;
        let records = read_all(&files)?;
        info!(
            dataset = self.name(),
            split,
            files = files.len(),
            records = records.len(),
            "loaded split"
        );
        Ok(TextDataset::new(split, records))
    }
}

/// Data files in a local directory
#[derive(Debug, Clone)]
pub struct LocalDatasetSource {
    root: PathBuf,
    name: String,
}

impl LocalDatasetSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(FetchError::DatasetNotFound {
                dataset: root.display().to_string(),
            });
        }
        let name = root.display().to_string();
        Ok(Self { root, name })
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for (prefix, dir) in [("", self.root.clone()), ("data/", self.root.join("data"))] {
            if !dir.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    files.push(format!("{prefix}{}", entry.file_name().to_string_lossy()));
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

impl DatasetSource for LocalDatasetSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn split_files(&self, split: &str) -> Result<Vec<PathBuf>> {
        let files: Vec<PathBuf> = self
            .list_files()?
            .into_iter()
            .filter(|f| matches_split(f, split))
            .map(|f| self.root.join(f))
            .collect();
        if files.is_empty() {
            return Err(FetchError::SplitNotFound {
                dataset: self.name.clone(),
                split: split.to_string(),
            });
        }
        Ok(files)
    }
}

/// Data files of a Hub dataset repo, downloaded on demand
pub struct HubDatasetSource {
    repo_id: String,
    fetcher: HfModelFetcher,
}

impl HubDatasetSource {
    pub fn new(repo_id: impl Into<String>, fetcher: HfModelFetcher) -> Result<Self> {
        let repo_id = repo_id.into();
        HfModelFetcher::check_hub_id(&repo_id)?;
        Ok(Self { repo_id, fetcher })
    }

    fn list_files(&self, repo: &hf_hub::api::sync::ApiRepo) -> Result<Vec<String>> {
        let info = repo.info().map_err(|e| {
            let message = e.to_string();
            if message.contains("404") {
                FetchError::DatasetNotFound {
                    dataset: self.repo_id.clone(),
                }
            } else {
                FetchError::Api { message }
            }
        })?;
        let mut files: Vec<String> = info.siblings.into_iter().map(|s| s.rfilename).collect();
        files.sort();
        Ok(files)
    }
}

impl DatasetSource for HubDatasetSource {
    fn name(&self) -> &str {
        &self.repo_id
    }

    fn split_files(&self, split: &str) -> Result<Vec<PathBuf>> {
        let api = self.fetcher.build_api()?;
        let repo = api.dataset(self.repo_id.clone());
        let wanted: Vec<String> = self
            .list_files(&repo)?
            .into_iter()
            .filter(|f| matches_split(f, split))
            .collect();
        if wanted.is_empty() {
            return Err(FetchError::SplitNotFound {
                dataset: self.repo_id.clone(),
                split: split.to_string(),
            });
        }
        wanted
            .iter()
            .map(|file| HfModelFetcher::download_file(&repo, &self.repo_id, file))
            .collect()
    }
}

/// Pick the source for a `data_path`: an existing directory is local,
/// anything else is a Hub dataset id
pub fn open_source(data_path: &str, token: Option<&str>) -> Result<Box<dyn DatasetSource>> {
    let local = Path::new(data_path);
    if local.is_dir() {
        debug!(path = %local.display(), "using local dataset directory");
        return Ok(Box::new(LocalDatasetSource::new(local)?));
    }
    Ok(Box::new(HubDatasetSource::new(
        data_path,
        HfModelFetcher::with_token(token),
    )?))
}

/// Load one split of a dataset
pub fn load_dataset(data_path: &str, split: &str, token: Option<&str>) -> Result<TextDataset> {
    open_source(data_path, token)?.load_split(split)
}
