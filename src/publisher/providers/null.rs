use crate::publisher::{NullBackendConfig, PublishError, Publisher};
use crate::submission::StagedPost;
use async_trait::async_trait;
use tracing::info;

pub struct NullPublisher {
    config: NullBackendConfig,
}

impl NullPublisher {
    pub fn new(config: NullBackendConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Publisher for NullPublisher {
    async fn publish(&self, post: &StagedPost) -> Result<(), PublishError> {
        if self.config.fail {
            return Err(PublishError::Backend(
                "null publisher is configured to fail".to_string(),
            ));
        }

        let body_preview = post.content.chars().take(200).collect::<String>();

        // Log the publish that would have happened
        info!(
            "NULL PUBLISHER - Would publish:\n\
             File: {}\n\
             Title: {}\n\
             Image: {}\n\
             Content (first 200 chars): {}{}",
            post.filename,
            post.title,
            post.image
                .as_ref()
                .map(|i| i.filename.as_str())
                .unwrap_or("none"),
            body_preview,
            if post.content.len() > 200 { "..." } else { "" }
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
