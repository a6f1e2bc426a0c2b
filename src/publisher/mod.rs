pub mod config;
pub mod error;
pub mod providers;

pub use config::*;
pub use error::*;

use crate::submission::StagedPost;
use async_trait::async_trait;
use std::sync::Arc;

/// Publishes a staged post into the remote content repository.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, post: &StagedPost) -> Result<(), PublishError>;
    fn name(&self) -> &str;
}

pub type DynPublisher = Arc<dyn Publisher>;

pub fn create_publisher(config: &PublisherConfig) -> Result<DynPublisher, PublishError> {
    match &config.backend {
        PublisherBackendConfig::Git(git_config) => Ok(Arc::new(
            providers::git::GitPublisher::new(git_config.clone())?,
        )),
        PublisherBackendConfig::Null(null_config) => Ok(Arc::new(
            providers::null::NullPublisher::new(null_config.clone()),
        )),
    }
}
