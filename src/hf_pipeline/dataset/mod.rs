//! Dataset loading
//!
//! Loads a named split from a local directory or a Hub dataset repo into
//! an in-memory [`TextDataset`], and normalizes its text column.

mod format;
mod process;
mod source;
mod text_dataset;


pub use format::{matches_split, read_records, DataFormat};
pub use process::process_data;
pub use source::{load_dataset, open_source, DatasetSource, HubDatasetSource, LocalDatasetSource};
pub use text_dataset::{Record, TextDataset};
