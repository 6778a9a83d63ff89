//! Hub publishing
//!
//! Publish a trained model folder to a Hub model repository.
//!
//! # Example
//!
//! ```ignore
//! use afinar::hf_pipeline::publish::{HfPublisher, PublishConfig};
//!
//! let publisher = HfPublisher::new(PublishConfig::model("username/my-model", None))?;
//! let result = publisher.publish_folder(Path::new("my-project"))?;
//! println!("{result}");
//! ```

pub mod config;
pub mod publisher;
pub mod result;

#[cfg(test)]
mod tests;

pub use config::{PublishConfig, RepoType, DEFAULT_ENDPOINT};
pub use publisher::{collect_files, HfPublisher};
pub use result::{PublishError, PublishResult};
