use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publish credential {0} is not set in the environment")]
    MissingToken(String),

    #[error("Invalid repository URL {url}: {source}")]
    InvalidRepoUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Publisher error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
